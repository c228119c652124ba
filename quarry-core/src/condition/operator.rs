use crate::{QuarryError, Result, Value};
use std::fmt::{self, Display};

/// Canonical comparison operator of a [`Filter`](crate::Filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Like,
    NotLike,
    Contains,
    StartsWith,
    EndsWith,
    DoesNotStartWith,
    DoesNotEndWith,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    IsPresent,
    IsBlank,
    IsTrue,
    IsFalse,
    IsNotTrue,
    IsNotFalse,
    IsEmptyNumericId,
    Box,
    Polygon,
    Circle,
}

/// Accepted spellings, compared after lower-casing and collapsing whitespace.
static ALIASES: &[(&str, Operator)] = &[
    ("=", Operator::Equal),
    ("==", Operator::Equal),
    ("eq", Operator::Equal),
    ("<>", Operator::NotEqual),
    ("!=", Operator::NotEqual),
    ("ne", Operator::NotEqual),
    ("noteq", Operator::NotEqual),
    (">", Operator::Greater),
    ("gt", Operator::Greater),
    (">=", Operator::GreaterEqual),
    ("gte", Operator::GreaterEqual),
    ("<", Operator::Less),
    ("lt", Operator::Less),
    ("<=", Operator::LessEqual),
    ("lte", Operator::LessEqual),
    ("like", Operator::Like),
    ("not like", Operator::NotLike),
    ("nlike", Operator::NotLike),
    ("contains", Operator::Contains),
    ("sw", Operator::StartsWith),
    ("ew", Operator::EndsWith),
    ("dnsw", Operator::DoesNotStartWith),
    ("dnew", Operator::DoesNotEndWith),
    ("in", Operator::In),
    ("not in", Operator::NotIn),
    ("notin", Operator::NotIn),
    ("between", Operator::Between),
    ("is null", Operator::IsNull),
    ("is_null", Operator::IsNull),
    ("is not null", Operator::IsNotNull),
    ("is_not_null", Operator::IsNotNull),
    ("is present", Operator::IsPresent),
    ("is_present", Operator::IsPresent),
    ("is blank", Operator::IsBlank),
    ("is_blank", Operator::IsBlank),
    ("is true", Operator::IsTrue),
    ("is_true", Operator::IsTrue),
    ("is false", Operator::IsFalse),
    ("is_false", Operator::IsFalse),
    ("is not true", Operator::IsNotTrue),
    ("is_not_true", Operator::IsNotTrue),
    ("is not false", Operator::IsNotFalse),
    ("is_not_false", Operator::IsNotFalse),
    ("is empty numeric id", Operator::IsEmptyNumericId),
    ("is_empty_numeric_id", Operator::IsEmptyNumericId),
    ("$box", Operator::Box),
    ("$polygon", Operator::Polygon),
    ("$circle", Operator::Circle),
];

impl Operator {
    /// Resolves any accepted spelling, case-insensitively.
    pub fn parse(value: &str) -> Result<Operator> {
        let token = value
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        ALIASES
            .iter()
            .find(|(k, _)| *k == token)
            .map(|(_, v)| *v)
            .ok_or_else(|| QuarryError::validation(format!("Unknown filter operator `{value}`")))
    }

    /// Canonical text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::Contains => "contains",
            Operator::StartsWith => "sw",
            Operator::EndsWith => "ew",
            Operator::DoesNotStartWith => "dnsw",
            Operator::DoesNotEndWith => "dnew",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Between => "between",
            Operator::IsNull => "is null",
            Operator::IsNotNull => "is not null",
            Operator::IsPresent => "is present",
            Operator::IsBlank => "is blank",
            Operator::IsTrue => "is true",
            Operator::IsFalse => "is false",
            Operator::IsNotTrue => "is not true",
            Operator::IsNotFalse => "is not false",
            Operator::IsEmptyNumericId => "is empty numeric id",
            Operator::Box => "$box",
            Operator::Polygon => "$polygon",
            Operator::Circle => "$circle",
        }
    }

    /// Operators that take no right operand.
    pub fn is_zero_value(&self) -> bool {
        matches!(
            self,
            Operator::IsNull
                | Operator::IsNotNull
                | Operator::IsPresent
                | Operator::IsBlank
                | Operator::IsTrue
                | Operator::IsFalse
                | Operator::IsNotTrue
                | Operator::IsNotFalse
                | Operator::IsEmptyNumericId
        )
    }

    pub fn is_multi_value(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn | Operator::Between)
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, Operator::Box | Operator::Polygon | Operator::Circle)
    }

    /// Brings `values` in canonical shape for this operator.
    ///
    /// Idempotent: `normalize` applied to its own output returns it unchanged.
    pub fn normalize(self, mut values: Vec<Value>) -> (Operator, Vec<Value>) {
        if self.is_zero_value() {
            return (self, Vec::new());
        }
        if self.is_multi_value() || self.is_geometry() {
            while let [Value::List(Some(list), ..)] = values.as_mut_slice() {
                values = std::mem::take(list);
            }
        }
        if !self.is_multi_value() {
            return (self, values);
        }
        let [Value::Varchar(Some(v))] = values.as_slice() else {
            return (self, values);
        };
        if self == Operator::Between {
            let bound = v.trim();
            let one_sided = if bound.starts_with(',') {
                Some(Operator::GreaterEqual)
            } else if bound.ends_with(',') {
                Some(Operator::LessEqual)
            } else {
                None
            };
            if let Some(operator) = one_sided {
                let value = bound.trim_matches(',').trim().to_string();
                return (operator, vec![Value::Varchar(Some(value))]);
            }
        }
        if !v.contains(',') {
            return (self, values);
        }
        let segments = v
            .split(',')
            .map(str::trim)
            .filter(|v| self == Operator::Between || !v.is_empty())
            .map(|v| Value::Varchar(Some(v.to_string())))
            .collect();
        (self, segments)
    }
}

/// Parses `operator` and normalizes `values` for it.
pub fn normalize(operator: &str, values: Vec<Value>) -> Result<(Operator, Vec<Value>)> {
    Ok(Operator::parse(operator)?.normalize(values))
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Operator {
    type Error = crate::Error;
    fn try_from(value: &str) -> Result<Self> {
        Operator::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(v: &str) -> Value {
        Value::Varchar(Some(v.into()))
    }

    #[test]
    fn aliases() {
        assert_eq!(Operator::parse("EQ").unwrap(), Operator::Equal);
        assert_eq!(Operator::parse("noteq").unwrap(), Operator::NotEqual);
        assert_eq!(Operator::parse("NotIn").unwrap(), Operator::NotIn);
        assert_eq!(Operator::parse("  not   IN ").unwrap(), Operator::NotIn);
        assert_eq!(Operator::parse("nlike").unwrap(), Operator::NotLike);
        assert_eq!(Operator::parse("is_present").unwrap(), Operator::IsPresent);
        assert_eq!(
            Operator::parse("IS_EMPTY_NUMERIC_ID").unwrap(),
            Operator::IsEmptyNumericId
        );
        assert!(Operator::parse("approximately").is_err());
    }

    #[test]
    fn canonical_text_parses_back() {
        for (_, op) in ALIASES {
            assert_eq!(Operator::parse(op.as_str()).unwrap(), *op);
        }
    }

    #[test]
    fn in_splits_commas() {
        let (op, values) = normalize("in", vec![text("a, b ,c")]).unwrap();
        assert_eq!(op, Operator::In);
        assert_eq!(values, vec![text("a"), text("b"), text("c")]);
    }

    #[test]
    fn between_one_sided() {
        assert_eq!(
            normalize("between", vec![text(",10")]).unwrap(),
            (Operator::GreaterEqual, vec![text("10")])
        );
        assert_eq!(
            normalize("between", vec![text("10,")]).unwrap(),
            (Operator::LessEqual, vec![text("10")])
        );
        assert_eq!(
            normalize("between", vec![text("1,10")]).unwrap(),
            (Operator::Between, vec![text("1"), text("10")])
        );
    }

    #[test]
    fn zero_value_drops_operands() {
        let (op, values) = normalize("is_null", vec![text("ignored")]).unwrap();
        assert_eq!(op, Operator::IsNull);
        assert!(values.is_empty());
    }

    #[test]
    fn list_is_flattened() {
        let list = Value::List(
            Some(vec![Value::Int32(Some(1)), Value::Int32(Some(2))]),
            Box::new(Value::Int32(None)),
        );
        let (_, values) = normalize("in", vec![list]).unwrap();
        assert_eq!(values, vec![Value::Int32(Some(1)), Value::Int32(Some(2))]);
    }

    #[test]
    fn flattened_list_is_split() {
        let list = |items: Vec<Value>| Value::List(Some(items), Box::new(Value::Varchar(None)));
        let (op, values) = Operator::In.normalize(vec![list(vec![text("a, b")])]);
        assert_eq!((op, values.clone()), (Operator::In, vec![text("a"), text("b")]));
        assert_eq!(op.normalize(values.clone()), (op, values));

        let (op, values) = Operator::Between.normalize(vec![list(vec![text(",5")])]);
        assert_eq!((op, values.clone()), (Operator::GreaterEqual, vec![text("5")]));
        assert_eq!(op.normalize(values.clone()), (op, values));

        let (op, values) = Operator::NotIn.normalize(vec![list(vec![list(vec![text(",")])])]);
        assert_eq!((op, values.clone()), (Operator::NotIn, vec![]));
        assert_eq!(op.normalize(values.clone()), (op, values));
    }
}
