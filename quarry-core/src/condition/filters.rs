use crate::{Filter, QuarryError, Result};
use std::fmt::{self, Display};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOperator {
    #[default]
    And,
    Or,
}

impl BoolOperator {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("and") => Ok(BoolOperator::And),
            v if v.eq_ignore_ascii_case("or") => Ok(BoolOperator::Or),
            _ => Err(QuarryError::validation(format!(
                "Unknown boolean operator `{value}`, expected `and` or `or`"
            ))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            BoolOperator::And => "AND",
            BoolOperator::Or => "OR",
        }
    }
}

impl Display for BoolOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoolOperator::And => "and",
            BoolOperator::Or => "or",
        })
    }
}

/// Boolean tree of filters: the leaves of this level plus nested sub-trees,
/// all joined by `operator`.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Filters {
    pub operator: BoolOperator,
    pub filters: Vec<Filter>,
    pub nested: Vec<Filters>,
}

impl Filters {
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            operator: BoolOperator::And,
            filters: filters.into_iter().collect(),
            nested: Vec::new(),
        }
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            operator: BoolOperator::Or,
            filters: filters.into_iter().collect(),
            nested: Vec::new(),
        }
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn nest(mut self, filters: Filters) -> Self {
        self.nested.push(filters);
        self
    }

    /// Number of direct terms (leaves and sub-trees) at this level.
    pub fn terms(&self) -> usize {
        self.filters.len() + self.nested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.nested.iter().all(Filters::is_empty)
    }

    /// Every leaf of the tree, depth first.
    pub fn leaves(&self) -> Box<dyn Iterator<Item = &Filter> + '_> {
        Box::new(
            self.filters
                .iter()
                .chain(self.nested.iter().flat_map(Filters::leaves)),
        )
    }
}

impl From<Filter> for Filters {
    fn from(value: Filter) -> Self {
        Filters::and([value])
    }
}
