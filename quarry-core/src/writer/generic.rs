use crate::{Dialect, Introspection, Result};

/// Standard SQL with `information_schema` introspection.
///
/// Used by the tests of this crate and as a fallback for databases close to
/// the standard. It knows nothing about identity columns or sequences.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "generic"
    }

    fn default_schema(&self) -> &'static str {
        "public"
    }

    fn introspection(&self, query: Introspection) -> Result<&'static str> {
        Ok(match query {
            Introspection::TableExists => {
                "SELECT COUNT(*) FROM information_schema.tables \
                WHERE LOWER(table_schema) = :schema AND LOWER(table_name) = :name \
                AND table_type = 'BASE TABLE'"
            }
            Introspection::ViewExists => {
                "SELECT COUNT(*) FROM information_schema.views \
                WHERE LOWER(table_schema) = :schema AND LOWER(table_name) = :name"
            }
            Introspection::PrimaryKeyColumns => {
                "SELECT kcu.column_name FROM information_schema.table_constraints tc \
                JOIN information_schema.key_column_usage kcu \
                ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
                WHERE tc.constraint_type = 'PRIMARY KEY' \
                AND LOWER(tc.table_schema) = :schema AND LOWER(tc.table_name) = :name \
                ORDER BY kcu.ordinal_position"
            }
            Introspection::Columns => {
                "SELECT column_name AS name, data_type AS type, \
                character_maximum_length AS length, is_nullable AS nullable \
                FROM information_schema.columns \
                WHERE LOWER(table_schema) = :schema AND LOWER(table_name) = :name \
                ORDER BY ordinal_position"
            }
            _ => return Err(crate::QuarryError::unsupported(self.name(), query.capability())),
        })
    }
}
