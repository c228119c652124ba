use crate::{Operator, Result, Value};

/// One predicate: `left operator right`.
///
/// `left` names a field (or column) of the target table, `relation.field`
/// reaches into a declared relation. The right operand is always a list, empty
/// for the zero-value operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub left: String,
    pub operator: Operator,
    pub right: Vec<Value>,
    pub case_sensitive: bool,
    pub escape: Option<char>,
}

impl Filter {
    /// Builds a filter from an operator spelling, `value` is normalized for it.
    ///
    /// ```rust
    /// use quarry_core::{Filter, Operator};
    /// let filter = Filter::new("status", "eq", "ACTIVE").unwrap();
    /// assert_eq!(filter.operator, Operator::Equal);
    /// assert_eq!(filter.right.len(), 1);
    /// ```
    pub fn new(left: impl Into<String>, operator: &str, value: impl Into<Value>) -> Result<Self> {
        Ok(Self::of(left, Operator::parse(operator)?, value))
    }

    /// Same as [`Filter::new`] with an already known operator.
    pub fn of(left: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::with_values(left, operator, vec![value.into()])
    }

    pub fn with_values(left: impl Into<String>, operator: Operator, values: Vec<Value>) -> Self {
        let (operator, right) = operator.normalize(values);
        Self {
            left: left.into(),
            operator,
            right,
            case_sensitive: true,
            escape: None,
        }
    }

    /// Filter for one of the operators taking no value (`is null`, `is blank`, ...).
    pub fn unary(left: impl Into<String>, operator: Operator) -> Self {
        Self::with_values(left, operator, Vec::new())
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn escape(mut self, escape: char) -> Self {
        self.escape = Some(escape);
        self
    }

    /// Runs normalization again, a no-op on any filter built by the constructors.
    pub fn normalized(self) -> Self {
        let (operator, right) = self.operator.normalize(self.right);
        Self {
            operator,
            right,
            ..self
        }
    }
}
