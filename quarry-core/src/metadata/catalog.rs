use crate::{
    AsValue, Dialect, Error, Executor, Introspection, Result, RowLabeled, Statement, Value,
    stream::TryStreamExt,
};
use log::trace;
use std::future::Future;

/// Column as described by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: String,
    pub length: Option<u32>,
    pub nullable: bool,
}

/// Schema introspection on top of any [`Executor`], using the statements of the dialect.
pub trait Catalog: Executor {
    /// Runs an introspection statement, names are compared lower-cased.
    fn introspect(
        &self,
        dialect: &dyn Dialect,
        query: Introspection,
        schema: &str,
        name: &str,
        column: Option<&str>,
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        async move {
            let mut statement = Statement::new(dialect.introspection(query)?)
                .with("schema", schema.to_lowercase())
                .with("name", name.to_lowercase());
            if let Some(column) = column {
                statement.bind("column", column.to_lowercase());
            }
            trace!("{query:?} {schema}.{name}");
            self.fetch(statement).try_collect().await
        }
    }

    /// Whether a `COUNT(*)` style introspection statement returns more than zero.
    fn exists(
        &self,
        dialect: &dyn Dialect,
        query: Introspection,
        schema: &str,
        name: &str,
        column: Option<&str>,
    ) -> impl Future<Output = Result<bool>> + Send {
        async move {
            let rows = self.introspect(dialect, query, schema, name, column).await?;
            let count = match rows.first().and_then(|v| v.values.first()) {
                Some(v) => i64::try_from_value(v.clone())?,
                None => 0,
            };
            Ok(count > 0)
        }
    }

    fn primary_key_columns(
        &self,
        dialect: &dyn Dialect,
        schema: &str,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send {
        async move {
            self.introspect(dialect, Introspection::PrimaryKeyColumns, schema, name, None)
                .await?
                .into_iter()
                .map(|row| {
                    let value = row.values.first().cloned().unwrap_or_default();
                    String::try_from_value(value)
                })
                .collect()
        }
    }

    fn columns(
        &self,
        dialect: &dyn Dialect,
        schema: &str,
        name: &str,
    ) -> impl Future<Output = Result<Vec<ColumnInfo>>> + Send {
        async move {
            self.introspect(dialect, Introspection::Columns, schema, name, None)
                .await?
                .into_iter()
                .map(|row| column_info(&row))
                .collect()
        }
    }
}

impl<E: Executor> Catalog for E {}

fn column_info(row: &RowLabeled) -> Result<ColumnInfo> {
    let get = |label: &str, index: usize| {
        row.get_column(label)
            .or_else(|| row.values.get(index))
            .cloned()
            .unwrap_or(Value::Null)
    };
    let name = String::try_from_value(get("name", 0))
        .map_err(|e| e.context("Invalid column name returned by introspection"))?;
    let sql_type = Option::<String>::try_from_value(get("type", 1))?.unwrap_or_default();
    let length = Option::<u32>::try_from_value(get("length", 2)).unwrap_or(None);
    let nullable = Option::<bool>::try_from_value(get("nullable", 3))
        .map_err(|e: Error| e.context(format!("Invalid nullability of column {name}")))?
        .unwrap_or(true);
    Ok(ColumnInfo {
        name,
        sql_type,
        length,
        nullable,
    })
}
