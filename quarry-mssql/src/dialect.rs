use log::warn;
use quarry_core::{
    Context, Dialect, Introspection, Lock, Result, SQL_RESERVED, SelectParts, Window,
    WriteParts, write_integer, write_merge,
};
use std::sync::LazyLock;

static RESERVED: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut result = SQL_RESERVED.to_vec();
    result.extend([
        "backup", "browse", "clustered", "database", "file", "holdlock", "identity", "index",
        "merge", "nocheck", "nonclustered", "percent", "plan", "proc", "rowcount", "top", "tran",
    ]);
    result
});

/// SQL Server: bracket quoting, `ROW_NUMBER()` paging, `WITH (...)` table
/// hints for locking, `MERGE` upserts and `NEXT VALUE FOR` sequences.
/// Booleans are `BIT` columns compared to 1 and 0.
#[derive(Default, Debug, Clone, Copy)]
pub struct MsSqlDialect;

impl Dialect for MsSqlDialect {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "mssql"
    }

    fn default_schema(&self) -> &'static str {
        "dbo"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &RESERVED
    }

    fn native_boolean(&self) -> bool {
        false
    }

    fn write_trim(&self, _context: &mut Context, out: &mut String, expression: &str) {
        out.push_str("LTRIM(RTRIM(");
        out.push_str(expression);
        out.push_str("))");
    }

    fn write_select(
        &self,
        context: &mut Context,
        out: &mut String,
        parts: &SelectParts,
        window: Option<Window>,
    ) {
        let Some(window) = window else {
            self.write_select_body(context, out, parts);
            return;
        };
        out.push_str("SELECT * FROM (SELECT ");
        out.push_str(&parts.columns);
        out.push_str(", ROW_NUMBER() OVER (ORDER BY ");
        if parts.order.is_empty() {
            out.push_str("(SELECT NULL)");
        } else {
            out.push_str(&parts.order);
        }
        out.push_str(") AS row_number__ FROM ");
        out.push_str(&parts.from);
        if !parts.filter.is_empty() {
            out.push_str(" WHERE ");
            out.push_str(&parts.filter);
        }
        if !parts.group.is_empty() {
            out.push_str(" GROUP BY ");
            out.push_str(&parts.group);
        }
        out.push_str(") w__ WHERE row_number__ > ");
        write_integer!(out, window.offset);
        if let Some(end) = window.end() {
            out.push_str(" AND row_number__ <= ");
            write_integer!(out, end);
        }
        out.push_str(" ORDER BY row_number__");
    }

    /// Locks are table hints, nothing goes at the end of the statement.
    fn write_lock_clause(&self, _context: &mut Context, _out: &mut String, _lock: &Lock) {}

    fn write_lock_table_hint(&self, _context: &mut Context, out: &mut String, lock: &Lock) {
        if lock.with_no_lock {
            out.push_str(" WITH (NOLOCK)");
            return;
        }
        match lock.timeout {
            Some(0) => out.push_str(" WITH (UPDLOCK, ROWLOCK, NOWAIT)"),
            Some(millis) => {
                warn!("mssql sets lock timeouts per session (SET LOCK_TIMEOUT), waiting {millis}ms is not expressible in a hint");
                out.push_str(" WITH (UPDLOCK, ROWLOCK)");
            }
            None => out.push_str(" WITH (UPDLOCK, ROWLOCK)"),
        }
    }

    fn write_upsert(&self, context: &mut Context, out: &mut String, parts: &WriteParts) -> Result<()> {
        write_merge(self, context, out, parts, "", ";");
        Ok(())
    }

    fn write_sequence_next_value(
        &self,
        context: &mut Context,
        out: &mut String,
        schema: &str,
        name: &str,
    ) -> Result<()> {
        out.push_str("SELECT NEXT VALUE FOR ");
        self.write_table_name(context, out, schema, name);
        Ok(())
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
            Introspection::IdentityColumn => {
                "SELECT COUNT(*) FROM sys.identity_columns ic \
                JOIN sys.tables t ON ic.object_id = t.object_id \
                JOIN sys.schemas s ON t.schema_id = s.schema_id \
                WHERE LOWER(s.name) = :schema AND LOWER(t.name) = :name \
                AND LOWER(ic.name) = :column"
            }
            Introspection::SequenceExists => {
                "SELECT COUNT(*) FROM sys.sequences q \
                JOIN sys.schemas s ON q.schema_id = s.schema_id \
                WHERE LOWER(s.name) = :schema AND LOWER(q.name) = :name"
            }
        })
    }
}
