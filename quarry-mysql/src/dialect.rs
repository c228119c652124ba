use quarry_core::{
    Context, Dialect, Introspection, Operator, QuarryError, Result, SQL_RESERVED, Value, Window,
    WriteParts, geometry_points, separated_by, write_integer,
};
use std::{fmt::Write, sync::LazyLock};

static RESERVED: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut result = SQL_RESERVED.to_vec();
    result.extend([
        "accessible", "change", "database", "div", "interval", "keys", "load", "lock", "match",
        "mod", "range", "read", "regexp", "rlike", "schema", "show", "status", "write",
    ]);
    result
});

/// MySQL and MariaDB: backtick quoting, `LIMIT`/`OFFSET` paging and
/// `ON DUPLICATE KEY UPDATE` upserts. There are no sequences, generated keys
/// are `AUTO_INCREMENT` columns.
#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn as_dyn(&self) -> &dyn Dialect {
        self
    }

    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &RESERVED
    }

    fn write_like_escape(&self, _context: &mut Context, out: &mut String, escape: char) {
        out.push_str(" ESCAPE '");
        match escape {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            v => out.push(v),
        }
        out.push('\'');
    }

    fn write_geometry_predicate(
        &self,
        context: &mut Context,
        out: &mut String,
        expression: &str,
        operator: Operator,
        values: &[Value],
    ) -> Result<Vec<(String, Value)>> {
        if operator != Operator::Box {
            return Err(QuarryError::unsupported(
                self.name(),
                format!("the `{operator}` geometry filter"),
            ));
        }
        let points = geometry_points(operator, values)?;
        let [(x1, y1), (x2, y2)] = points.as_slice() else {
            return Err(QuarryError::validation("Operator `$box` takes two corners"));
        };
        let mut polygon = String::new();
        let _ = write!(
            polygon,
            "POLYGON(({x1} {y1}, {x2} {y1}, {x2} {y2}, {x1} {y2}, {x1} {y1}))"
        );
        let name = context.parameter_name("box");
        out.push_str("MBRContains(ST_GeomFromText(");
        self.write_parameter(context, out, &name);
        out.push_str("), ");
        out.push_str(expression);
        out.push(')');
        Ok(vec![(name, Value::Varchar(Some(polygon)))])
    }

    fn write_limit_offset(&self, _context: &mut Context, out: &mut String, window: Window) {
        match window.limit {
            Some(limit) => {
                out.push_str(" LIMIT ");
                write_integer!(out, limit);
            }
            // No way to skip rows without a limit
            None if window.offset > 0 => out.push_str(" LIMIT 18446744073709551615"),
            None => {}
        }
        if window.offset > 0 {
            out.push_str(" OFFSET ");
            write_integer!(out, window.offset);
        }
    }

    fn write_upsert(&self, context: &mut Context, out: &mut String, parts: &WriteParts) -> Result<()> {
        self.write_insert(context, out, parts);
        out.push_str(" ON DUPLICATE KEY UPDATE ");
        let updated = parts
            .columns
            .iter()
            .filter(|c| !parts.keys.contains(c))
            .collect::<Vec<_>>();
        if updated.is_empty() {
            // Keeps the existing row
            separated_by(
                out,
                parts.keys.iter().take(1),
                |out, v| {
                    self.write_identifier(context, out, v);
                    out.push_str(" = ");
                    self.write_identifier(context, out, v);
                },
                ", ",
            );
            return Ok(());
        }
        separated_by(
            out,
            updated,
            |out, v| {
                self.write_identifier(context, out, v);
                out.push_str(" = VALUES(");
                self.write_identifier(context, out, v);
                out.push(')');
            },
            ", ",
        );
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
                "SELECT column_name FROM information_schema.key_column_usage \
                WHERE constraint_name = 'PRIMARY' \
                AND LOWER(table_schema) = :schema AND LOWER(table_name) = :name \
                ORDER BY ordinal_position"
            }
            Introspection::Columns => {
                "SELECT column_name AS name, data_type AS type, \
                character_maximum_length AS length, is_nullable AS nullable \
                FROM information_schema.columns \
                WHERE LOWER(table_schema) = :schema AND LOWER(table_name) = :name \
                ORDER BY ordinal_position"
            }
            Introspection::IdentityColumn => {
                "SELECT COUNT(*) FROM information_schema.columns \
                WHERE LOWER(table_schema) = :schema AND LOWER(table_name) = :name \
                AND LOWER(column_name) = :column AND extra LIKE '%auto_increment%'"
            }
            Introspection::SequenceExists => {
                return Err(QuarryError::unsupported(self.name(), query.capability()));
            }
        })
    }
}
