use log::warn;
use quarry_core::{
    Context, DataType, Dialect, Introspection, Lock, Operator, Result, SelectParts, Window,
    WriteParts, write_integer, write_merge, write_standard_empty_predicate,
};

/// Oracle: `ROWNUM` paging, `MERGE` upserts, `NEXTVAL` sequences and
/// `NUMBER(1)` booleans compared to 1 and 0.
///
/// Oracle stores the empty string as NULL, text presence checks only look at
/// the trimmed value.
#[derive(Default, Debug, Clone, Copy)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "oracle"
    }

    fn native_boolean(&self) -> bool {
        false
    }

    fn write_empty_predicate(
        &self,
        context: &mut Context,
        out: &mut String,
        expression: &str,
        operator: Operator,
        data_type: DataType,
    ) -> Result<()> {
        match operator {
            Operator::IsPresent | Operator::IsBlank if data_type.is_text() => {
                self.write_trim(context, out, expression);
                out.push_str(if operator == Operator::IsPresent {
                    " IS NOT NULL"
                } else {
                    " IS NULL"
                });
                Ok(())
            }
            _ => write_standard_empty_predicate(self, context, out, expression, operator, data_type),
        }
    }

    fn write_select(
        &self,
        context: &mut Context,
        out: &mut String,
        parts: &SelectParts,
        window: Option<Window>,
    ) {
        match window {
            None => self.write_select_body(context, out, parts),
            Some(window) if window.offset == 0 => {
                out.push_str("SELECT * FROM (");
                self.write_select_body(context, out, parts);
                out.push(')');
                if let Some(end) = window.end() {
                    out.push_str(" WHERE ROWNUM <= ");
                    write_integer!(out, end);
                }
            }
            Some(window) => {
                out.push_str("SELECT * FROM (SELECT q__.*, ROWNUM rownum__ FROM (");
                self.write_select_body(context, out, parts);
                out.push_str(") q__");
                if let Some(end) = window.end() {
                    out.push_str(" WHERE ROWNUM <= ");
                    write_integer!(out, end);
                }
                out.push_str(") WHERE rownum__ > ");
                write_integer!(out, window.offset);
            }
        }
        if let Some(lock) = &parts.lock {
            self.write_lock_clause(context, out, lock);
        }
    }

    fn write_lock_clause(&self, _context: &mut Context, out: &mut String, lock: &Lock) {
        if lock.with_no_lock {
            warn!("oracle readers never block, the no lock request is ignored");
            return;
        }
        out.push_str(" FOR UPDATE");
        match lock.timeout {
            Some(0) => out.push_str(" NOWAIT"),
            Some(millis) => {
                out.push_str(" WAIT ");
                write_integer!(out, (millis + 999) / 1000);
            }
            None => {}
        }
    }

    fn write_upsert(&self, context: &mut Context, out: &mut String, parts: &WriteParts) -> Result<()> {
        write_merge(self, context, out, parts, " FROM DUAL", "");
        Ok(())
    }

    fn write_sequence_next_value(
        &self,
        context: &mut Context,
        out: &mut String,
        schema: &str,
        name: &str,
    ) -> Result<()> {
        out.push_str("SELECT ");
        self.write_table_name(context, out, schema, name);
        out.push_str(".NEXTVAL FROM DUAL");
        Ok(())
    }

    fn introspection(&self, query: Introspection) -> Result<&'static str> {
        Ok(match query {
            Introspection::TableExists => {
                "SELECT COUNT(*) FROM all_tables \
                WHERE LOWER(owner) = :schema AND LOWER(table_name) = :name"
            }
            Introspection::ViewExists => {
                "SELECT COUNT(*) FROM all_views \
                WHERE LOWER(owner) = :schema AND LOWER(view_name) = :name"
            }
            Introspection::PrimaryKeyColumns => {
                "SELECT cc.column_name FROM all_constraints c \
                JOIN all_cons_columns cc \
                ON c.owner = cc.owner AND c.constraint_name = cc.constraint_name \
                WHERE c.constraint_type = 'P' \
                AND LOWER(c.owner) = :schema AND LOWER(c.table_name) = :name \
                ORDER BY cc.position"
            }
            Introspection::Columns => {
                "SELECT column_name AS name, data_type AS type, \
                char_length AS length, nullable AS nullable \
                FROM all_tab_columns \
                WHERE LOWER(owner) = :schema AND LOWER(table_name) = :name \
                ORDER BY column_id"
            }
            Introspection::IdentityColumn => {
                "SELECT COUNT(*) FROM all_tab_identity_cols \
                WHERE LOWER(owner) = :schema AND LOWER(table_name) = :name \
                AND LOWER(column_name) = :column"
            }
            Introspection::SequenceExists => {
                "SELECT COUNT(*) FROM all_sequences \
                WHERE LOWER(sequence_owner) = :schema AND LOWER(sequence_name) = :name"
            }
        })
    }
}
