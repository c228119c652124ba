mod filter;
mod filters;
mod operator;
mod page;
mod query;

pub use filter::*;
pub use filters::*;
pub use operator::*;
pub use page::*;
pub use query::*;

use crate::{AsValue, QuarryError, Record, Result, Table, Value};

/// What the session operations accept as selection criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Query(Query),
    Filters(Filters),
    Filter(Filter),
    /// Primary key values, in key column order.
    Key(Vec<Value>),
    /// Field name to value, each one an equality.
    Map(Vec<(String, Value)>),
}

impl Condition {
    /// Everything.
    pub fn all() -> Self {
        Condition::Query(Query::default())
    }

    /// Single column primary key shorthand.
    pub fn key(value: impl AsValue) -> Self {
        Condition::Key(vec![value.as_value()])
    }

    pub fn composite_key(values: Vec<Value>) -> Self {
        Condition::Key(values)
    }

    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Condition::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Equalities on every scalar field of `record` that is not null.
    pub fn from_record<R: Record>(record: &R) -> Self {
        Condition::Map(
            R::record_def()
                .fields
                .iter()
                .filter(|f| !f.ignore && f.relation.is_none())
                .filter_map(|f| {
                    record
                        .get_field(f.name)
                        .filter(|v| !v.is_null())
                        .map(|v| (f.name.to_string(), v))
                })
                .collect(),
        )
    }

    /// Lowers the condition to a full query against `table`.
    pub fn into_query(self, table: &Table) -> Result<Query> {
        Ok(match self {
            Condition::Query(v) => v,
            Condition::Filters(v) => v.into(),
            Condition::Filter(v) => v.into(),
            Condition::Key(values) => {
                if table.primary_key.is_empty() {
                    return Err(QuarryError::validation(format!(
                        "Table {} has no primary key",
                        table.full_name()
                    )));
                }
                if values.len() != table.primary_key.len() {
                    return Err(QuarryError::validation(format!(
                        "Table {} has {} primary key columns, {} values were given",
                        table.full_name(),
                        table.primary_key.len(),
                        values.len()
                    )));
                }
                Filters::and(
                    table
                        .primary_key
                        .iter()
                        .zip(values)
                        .map(|(column, value)| Filter::of(column.clone(), Operator::Equal, value)),
                )
                .into()
            }
            Condition::Map(entries) => Filters::and(
                entries
                    .into_iter()
                    .map(|(field, value)| Filter::of(field, Operator::Equal, value)),
            )
            .into(),
        })
    }
}

impl From<Query> for Condition {
    fn from(value: Query) -> Self {
        Condition::Query(value)
    }
}

impl From<Filters> for Condition {
    fn from(value: Filters) -> Self {
        Condition::Filters(value)
    }
}

impl From<Filter> for Condition {
    fn from(value: Filter) -> Self {
        Condition::Filter(value)
    }
}

/// A bare value selects by single column primary key.
impl<T: AsValue> From<T> for Condition {
    fn from(value: T) -> Self {
        Condition::key(value)
    }
}
