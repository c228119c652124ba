use log::warn;
use quarry_core::{
    Context, Dialect, Introspection, Lock, QuarryError, Result, Window, WriteParts,
    write_integer, write_on_conflict,
};

/// SQLite: `LIMIT`/`OFFSET` paging, `ON CONFLICT` upserts, introspection
/// through the `pragma_table_list` and `pragma_table_info` functions.
///
/// There is no row locking, lock requests are dropped with a warning. An
/// `INTEGER PRIMARY KEY` column is the identity (the rowid alias).
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn default_schema(&self) -> &'static str {
        "main"
    }

    fn write_limit_offset(&self, _context: &mut Context, out: &mut String, window: Window) {
        match window.limit {
            Some(limit) => {
                out.push_str(" LIMIT ");
                write_integer!(out, limit);
            }
            None if window.offset > 0 => out.push_str(" LIMIT -1"),
            None => {}
        }
        if window.offset > 0 {
            out.push_str(" OFFSET ");
            write_integer!(out, window.offset);
        }
    }

    fn write_lock_clause(&self, _context: &mut Context, _out: &mut String, lock: &Lock) {
        warn!("sqlite locks whole databases, the row lock request {lock:?} is ignored");
    }

    fn write_upsert(&self, context: &mut Context, out: &mut String, parts: &WriteParts) -> Result<()> {
        write_on_conflict(self, context, out, parts);
        Ok(())
    }

    fn introspection(&self, query: Introspection) -> Result<&'static str> {
        Ok(match query {
            Introspection::TableExists => {
                "SELECT COUNT(*) FROM pragma_table_list \
                WHERE LOWER(schema) = :schema AND LOWER(name) = :name AND type = 'table'"
            }
            Introspection::ViewExists => {
                "SELECT COUNT(*) FROM pragma_table_list \
                WHERE LOWER(schema) = :schema AND LOWER(name) = :name AND type = 'view'"
            }
            Introspection::PrimaryKeyColumns => {
                "SELECT name FROM pragma_table_info(:name, :schema) WHERE pk > 0 ORDER BY pk"
            }
            Introspection::Columns => {
                "SELECT name, type, NULL AS length, \
                CASE WHEN \"notnull\" = 0 THEN 1 ELSE 0 END AS nullable \
                FROM pragma_table_info(:name, :schema) ORDER BY cid"
            }
            Introspection::IdentityColumn => {
                "SELECT COUNT(*) FROM pragma_table_info(:name, :schema) \
                WHERE LOWER(name) = :column AND pk = 1 AND LOWER(type) = 'integer' \
                AND (SELECT COUNT(*) FROM pragma_table_info(:name, :schema) WHERE pk > 0) = 1"
            }
            Introspection::SequenceExists => {
                return Err(QuarryError::unsupported(self.name(), query.capability()));
            }
        })
    }
}
