use quarry_core::{
    Context, Dialect, Introspection, Operator, QuarryError, Result, SQL_RESERVED, Value,
    WriteParts, geometry_points, write_on_conflict,
};
use std::{fmt::Write, sync::LazyLock};

static RESERVED: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut result = SQL_RESERVED.to_vec();
    result.extend(["analyse", "analyze", "array", "asymmetric", "leading", "trailing", "verbose"]);
    result
});

/// Postgres: `LIMIT`/`OFFSET` paging, `FOR UPDATE [NOWAIT]`, `ON CONFLICT`
/// upserts, `nextval` sequences and `<@` geometric containment.
#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "postgres"
    }

    fn default_schema(&self) -> &'static str {
        "public"
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &RESERVED
    }

    fn write_geometry_predicate(
        &self,
        context: &mut Context,
        out: &mut String,
        expression: &str,
        operator: Operator,
        values: &[Value],
    ) -> Result<Vec<(String, Value)>> {
        if !matches!(operator, Operator::Box | Operator::Polygon) {
            return Err(QuarryError::unsupported(
                self.name(),
                format!("the `{operator}` geometry filter"),
            ));
        }
        let points = geometry_points(operator, values)?;
        let mut params = Vec::new();
        out.push_str(expression);
        match operator {
            Operator::Box => {
                out.push_str(" <@ box(");
                for (i, (x, y)) in points.into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let x_name = context.parameter_name("box");
                    let y_name = context.parameter_name("box");
                    out.push_str("point(");
                    self.write_parameter(context, out, &x_name);
                    out.push_str(", ");
                    self.write_parameter(context, out, &y_name);
                    out.push(')');
                    params.push((x_name, Value::Float64(Some(x))));
                    params.push((y_name, Value::Float64(Some(y))));
                }
                out.push(')');
            }
            _ => {
                let mut text = String::from("(");
                for (i, (x, y)) in points.into_iter().enumerate() {
                    if i > 0 {
                        text.push(',');
                    }
                    let _ = write!(text, "({x},{y})");
                }
                text.push(')');
                let name = context.parameter_name("polygon");
                out.push_str(" <@ CAST(");
                self.write_parameter(context, out, &name);
                out.push_str(" AS polygon)");
                params.push((name, Value::Varchar(Some(text))));
            }
        }
        Ok(params)
    }

    fn write_upsert(&self, context: &mut Context, out: &mut String, parts: &WriteParts) -> Result<()> {
        write_on_conflict(self, context, out, parts);
        Ok(())
    }

    fn write_sequence_next_value(
        &self,
        context: &mut Context,
        out: &mut String,
        schema: &str,
        name: &str,
    ) -> Result<()> {
        let mut sequence = String::new();
        self.write_table_name(context, &mut sequence, schema, name);
        out.push_str("SELECT nextval('");
        out.push_str(&sequence.replace('\'', "''"));
        out.push_str("')");
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
                "SELECT column_name AS name, udt_name AS type, \
                character_maximum_length AS length, is_nullable AS nullable \
                FROM information_schema.columns \
                WHERE LOWER(table_schema) = :schema AND LOWER(table_name) = :name \
                ORDER BY ordinal_position"
            }
            Introspection::IdentityColumn => {
                "SELECT COUNT(*) FROM information_schema.columns \
                WHERE LOWER(table_schema) = :schema AND LOWER(table_name) = :name \
                AND LOWER(column_name) = :column \
                AND (is_identity = 'YES' OR column_default LIKE 'nextval(%')"
            }
            Introspection::SequenceExists => {
                "SELECT COUNT(*) FROM information_schema.sequences \
                WHERE LOWER(sequence_schema) = :schema AND LOWER(sequence_name) = :name"
            }
        })
    }
}
