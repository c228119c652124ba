use crate::{
    AsValue, DataType, Lock, Operator, QuarryError, Result, Value, Window, separated_by,
    util::parameter_base, write_integer, writer::Context,
};
use log::warn;

/// Schema introspection statements a dialect can provide.
///
/// Every statement binds the lower-cased `:schema` and `:name` parameters,
/// [`Introspection::IdentityColumn`] also binds `:column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Introspection {
    /// `COUNT(*)` of base tables named `:name` in `:schema`.
    TableExists,
    /// `COUNT(*)` of views named `:name` in `:schema`.
    ViewExists,
    /// Primary key column names in key order.
    PrimaryKeyColumns,
    /// Rows labeled `name`, `type`, `length`, `nullable` in declaration order.
    Columns,
    /// `COUNT(*)` of identity (auto-increment) columns named `:column`.
    IdentityColumn,
    /// `COUNT(*)` of sequences named `:name` in `:schema`.
    SequenceExists,
}

impl Introspection {
    pub const ALL: [Introspection; 6] = [
        Introspection::TableExists,
        Introspection::ViewExists,
        Introspection::PrimaryKeyColumns,
        Introspection::Columns,
        Introspection::IdentityColumn,
        Introspection::SequenceExists,
    ];

    pub fn capability(&self) -> &'static str {
        match self {
            Introspection::TableExists => "table existence introspection",
            Introspection::ViewExists => "view existence introspection",
            Introspection::PrimaryKeyColumns => "primary key introspection",
            Introspection::Columns => "column introspection",
            Introspection::IdentityColumn => "identity column introspection",
            Introspection::SequenceExists => "sequence introspection",
        }
    }
}

/// Pieces of a select statement, already rendered, that a dialect assembles.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SelectParts {
    pub columns: String,
    /// Base table followed by the joins.
    pub from: String,
    /// Content of the WHERE clause, empty when unfiltered.
    pub filter: String,
    pub group: String,
    pub order: String,
    pub lock: Option<Lock>,
}

/// Table and column names of a write statement.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct WriteParts<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    /// Columns receiving a value.
    pub columns: Vec<&'a str>,
    /// Columns identifying the row.
    pub keys: Vec<&'a str>,
}

/// Words that need quoting in most databases.
pub static SQL_RESERVED: &[&str] = &[
    "all", "alter", "and", "any", "as", "asc", "between", "by", "case", "check", "column",
    "constraint", "create", "cross", "current", "current_date", "current_time",
    "current_timestamp", "current_user", "default", "delete", "desc", "distinct", "drop", "else",
    "end", "except", "exists", "false", "fetch", "for", "foreign", "from", "full", "grant",
    "group", "having", "in", "inner", "insert", "intersect", "into", "is", "join", "key",
    "left", "like", "limit", "natural", "not", "null", "offset", "on", "or", "order", "outer",
    "primary", "references", "right", "select", "session_user", "set", "some", "table", "then",
    "to", "true", "union", "unique", "update", "user", "using", "values", "when", "where",
    "with",
];

/// Per-database rendering rules.
///
/// Every method has a default that produces standard SQL, dialects override
/// the parts where their database deviates. Rendering happens into a `String`
/// buffer, the [`Context`] tells which clause is being written and carries the
/// parameter counter.
pub trait Dialect: Send + Sync {
    fn as_dyn(&self) -> &dyn Dialect;

    /// Registry key, also the scheme of the connection URL.
    fn name(&self) -> &'static str;

    /// Schema used when none is configured.
    fn default_schema(&self) -> &'static str {
        ""
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        SQL_RESERVED
    }

    fn is_reserved(&self, word: &str) -> bool {
        self.reserved_words()
            .iter()
            .any(|v| v.eq_ignore_ascii_case(word))
    }

    /// Writes a name, quoting it only when the table opted in and the word is reserved.
    fn write_identifier(&self, context: &mut Context, out: &mut String, value: &str) {
        if !context.escape_reserved || !self.is_reserved(value) {
            out.push_str(value);
            return;
        }
        let (open, close) = self.identifier_quotes();
        out.push(open);
        for c in value.chars() {
            if c == close {
                out.push(close);
            }
            out.push(c);
        }
        out.push(close);
    }

    fn write_table_name(&self, context: &mut Context, out: &mut String, schema: &str, name: &str) {
        if !schema.is_empty() {
            self.write_identifier(context, out, schema);
            out.push('.');
        }
        self.write_identifier(context, out, name);
    }

    /// Column reference, prefixed by `alias` when the context qualifies columns.
    fn write_column(&self, context: &mut Context, out: &mut String, alias: &str, column: &str) {
        if context.qualify_columns && !alias.is_empty() {
            self.write_identifier(context, out, alias);
            out.push('.');
        }
        self.write_identifier(context, out, column);
    }

    /// Whether `IS TRUE` and friends exist, otherwise booleans are compared to 1 and 0.
    fn native_boolean(&self) -> bool {
        true
    }

    fn write_lower(&self, _context: &mut Context, out: &mut String, expression: &str) {
        out.push_str("LOWER(");
        out.push_str(expression);
        out.push(')');
    }

    fn write_trim(&self, _context: &mut Context, out: &mut String, expression: &str) {
        out.push_str("TRIM(");
        out.push_str(expression);
        out.push(')');
    }

    /// Named placeholder.
    fn write_parameter(&self, _context: &mut Context, out: &mut String, name: &str) {
        out.push(':');
        out.push_str(name);
    }

    fn write_like_escape(&self, _context: &mut Context, out: &mut String, escape: char) {
        out.push_str(" ESCAPE '");
        if escape == '\'' {
            out.push('\'');
        }
        out.push(escape);
        out.push('\'');
    }

    /// Predicate of an operator taking no value, `expression` is the rendered column.
    fn write_empty_predicate(
        &self,
        context: &mut Context,
        out: &mut String,
        expression: &str,
        operator: Operator,
        data_type: DataType,
    ) -> Result<()> {
        write_standard_empty_predicate(self.as_dyn(), context, out, expression, operator, data_type)
    }

    /// Geometry search (`$box`, `$polygon`, `$circle`), returns the parameters it bound.
    fn write_geometry_predicate(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _expression: &str,
        operator: Operator,
        _values: &[Value],
    ) -> Result<Vec<(String, Value)>> {
        Err(QuarryError::unsupported(
            self.name(),
            format!("the `{operator}` geometry filter"),
        ))
    }

    /// Assembles a select statement, restricted to `window` when given.
    fn write_select(
        &self,
        context: &mut Context,
        out: &mut String,
        parts: &SelectParts,
        window: Option<Window>,
    ) {
        self.write_select_body(context, out, parts);
        if let Some(window) = window {
            self.write_limit_offset(context, out, window);
        }
        if let Some(lock) = &parts.lock {
            self.write_lock_clause(context, out, lock);
        }
    }

    /// `SELECT ... FROM ... [WHERE] [GROUP BY] [ORDER BY]`, without window and lock.
    fn write_select_body(&self, _context: &mut Context, out: &mut String, parts: &SelectParts) {
        out.push_str("SELECT ");
        out.push_str(&parts.columns);
        out.push_str(" FROM ");
        out.push_str(&parts.from);
        if !parts.filter.is_empty() {
            out.push_str(" WHERE ");
            out.push_str(&parts.filter);
        }
        if !parts.group.is_empty() {
            out.push_str(" GROUP BY ");
            out.push_str(&parts.group);
        }
        if !parts.order.is_empty() {
            out.push_str(" ORDER BY ");
            out.push_str(&parts.order);
        }
    }

    /// Trailing pagination clause of the offset/limit dialects.
    fn write_limit_offset(&self, _context: &mut Context, out: &mut String, window: Window) {
        if let Some(limit) = window.limit {
            out.push_str(" LIMIT ");
            write_integer!(out, limit);
        }
        if window.offset > 0 {
            out.push_str(" OFFSET ");
            write_integer!(out, window.offset);
        }
    }

    /// Row locking clause at the end of a select.
    fn write_lock_clause(&self, _context: &mut Context, out: &mut String, lock: &Lock) {
        if lock.with_no_lock {
            warn!(
                "{} has no read uncommitted hint, the lock request is ignored",
                self.name()
            );
            return;
        }
        out.push_str(" FOR UPDATE");
        if lock.timeout == Some(0) {
            out.push_str(" NOWAIT");
        }
    }

    /// Hint written right after every table reference of a locked select.
    fn write_lock_table_hint(&self, _context: &mut Context, _out: &mut String, _lock: &Lock) {}

    fn write_insert(&self, context: &mut Context, out: &mut String, parts: &WriteParts) {
        out.push_str("INSERT INTO ");
        self.write_table_name(context, out, parts.schema, parts.table);
        out.push_str(" (");
        separated_by(
            out,
            &parts.columns,
            |out, v| self.write_identifier(context, out, v),
            ", ",
        );
        out.push_str(") VALUES (");
        separated_by(
            out,
            &parts.columns,
            |out, v| self.write_parameter(context, out, &parameter_base(v)),
            ", ",
        );
        out.push(')');
    }

    fn write_update(&self, context: &mut Context, out: &mut String, parts: &WriteParts) {
        out.push_str("UPDATE ");
        self.write_table_name(context, out, parts.schema, parts.table);
        out.push_str(" SET ");
        separated_by(
            out,
            &parts.columns,
            |out, v| {
                self.write_identifier(context, out, v);
                out.push_str(" = ");
                self.write_parameter(context, out, &parameter_base(v));
            },
            ", ",
        );
        self.write_key_filter(context, out, &parts.keys);
    }

    fn write_delete(&self, context: &mut Context, out: &mut String, parts: &WriteParts) {
        out.push_str("DELETE FROM ");
        self.write_table_name(context, out, parts.schema, parts.table);
        self.write_key_filter(context, out, &parts.keys);
    }

    /// ` WHERE k1 = :k1 AND k2 = :k2`.
    fn write_key_filter(&self, context: &mut Context, out: &mut String, keys: &[&str]) {
        out.push_str(" WHERE ");
        separated_by(
            out,
            keys,
            |out, v| {
                self.write_identifier(context, out, v);
                out.push_str(" = ");
                self.write_parameter(context, out, &parameter_base(v));
            },
            " AND ",
        );
    }

    /// Insert or update keyed by `parts.keys`.
    fn write_upsert(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _parts: &WriteParts,
    ) -> Result<()> {
        Err(QuarryError::unsupported(self.name(), "upsert"))
    }

    /// Single row, single column statement returning the next value of a sequence.
    fn write_sequence_next_value(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _schema: &str,
        _name: &str,
    ) -> Result<()> {
        Err(QuarryError::unsupported(self.name(), "sequences"))
    }

    fn introspection(&self, query: Introspection) -> Result<&'static str> {
        Err(QuarryError::unsupported(self.name(), query.capability()))
    }
}

/// `INSERT ... ON CONFLICT (keys) DO UPDATE SET c = EXCLUDED.c`.
pub fn write_on_conflict(
    dialect: &dyn Dialect,
    context: &mut Context,
    out: &mut String,
    parts: &WriteParts,
) {
    dialect.write_insert(context, out, parts);
    out.push_str(" ON CONFLICT (");
    separated_by(
        out,
        &parts.keys,
        |out, v| dialect.write_identifier(context, out, v),
        ", ",
    );
    out.push(')');
    let updated = parts
        .columns
        .iter()
        .filter(|c| !parts.keys.contains(c))
        .collect::<Vec<_>>();
    if updated.is_empty() {
        out.push_str(" DO NOTHING");
        return;
    }
    out.push_str(" DO UPDATE SET ");
    separated_by(
        out,
        updated,
        |out, v| {
            dialect.write_identifier(context, out, v);
            out.push_str(" = EXCLUDED.");
            dialect.write_identifier(context, out, v);
        },
        ", ",
    );
}

/// `MERGE` based upsert, `source_suffix` completes the source select (`FROM DUAL`).
pub fn write_merge(
    dialect: &dyn Dialect,
    context: &mut Context,
    out: &mut String,
    parts: &WriteParts,
    source_suffix: &str,
    terminator: &str,
) {
    out.push_str("MERGE INTO ");
    dialect.write_table_name(context, out, parts.schema, parts.table);
    out.push_str(" t__ USING (SELECT ");
    separated_by(
        out,
        &parts.columns,
        |out, v| {
            dialect.write_parameter(context, out, &parameter_base(v));
            out.push_str(" AS ");
            dialect.write_identifier(context, out, v);
        },
        ", ",
    );
    out.push_str(source_suffix);
    out.push_str(") s__ ON (");
    separated_by(
        out,
        &parts.keys,
        |out, v| {
            out.push_str("t__.");
            dialect.write_identifier(context, out, v);
            out.push_str(" = s__.");
            dialect.write_identifier(context, out, v);
        },
        " AND ",
    );
    out.push(')');
    let updated = parts
        .columns
        .iter()
        .filter(|c| !parts.keys.contains(c))
        .collect::<Vec<_>>();
    if !updated.is_empty() {
        out.push_str(" WHEN MATCHED THEN UPDATE SET ");
        separated_by(
            out,
            updated,
            |out, v| {
                out.push_str("t__.");
                dialect.write_identifier(context, out, v);
                out.push_str(" = s__.");
                dialect.write_identifier(context, out, v);
            },
            ", ",
        );
    }
    out.push_str(" WHEN NOT MATCHED THEN INSERT (");
    separated_by(
        out,
        &parts.columns,
        |out, v| dialect.write_identifier(context, out, v),
        ", ",
    );
    out.push_str(") VALUES (");
    separated_by(
        out,
        &parts.columns,
        |out, v| {
            out.push_str("s__.");
            dialect.write_identifier(context, out, v);
        },
        ", ",
    );
    out.push(')');
    out.push_str(terminator);
}

/// Zero value predicates as standard SQL, with `= 1`/`= 0` comparisons when
/// the dialect has no native boolean.
pub fn write_standard_empty_predicate(
    dialect: &dyn Dialect,
    context: &mut Context,
    out: &mut String,
    expression: &str,
    operator: Operator,
    data_type: DataType,
) -> Result<()> {
    let native = dialect.native_boolean();
    match operator {
        Operator::IsNull => {
            out.push_str(expression);
            out.push_str(" IS NULL");
        }
        Operator::IsNotNull => {
            out.push_str(expression);
            out.push_str(" IS NOT NULL");
        }
        Operator::IsPresent | Operator::IsBlank if data_type.is_text() => {
            let present = operator == Operator::IsPresent;
            out.push('(');
            out.push_str(expression);
            out.push_str(if present {
                " IS NOT NULL AND "
            } else {
                " IS NULL OR "
            });
            dialect.write_trim(context, out, expression);
            out.push_str(if present { " <> '')" } else { " = '')" });
        }
        Operator::IsPresent => {
            out.push_str(expression);
            out.push_str(" IS NOT NULL");
        }
        Operator::IsBlank => {
            out.push_str(expression);
            out.push_str(" IS NULL");
        }
        Operator::IsTrue | Operator::IsFalse | Operator::IsNotTrue | Operator::IsNotFalse
            if native =>
        {
            out.push_str(expression);
            out.push(' ');
            out.push_str(&operator.as_str().to_uppercase());
        }
        Operator::IsTrue | Operator::IsFalse => {
            out.push_str(expression);
            out.push_str(if operator == Operator::IsTrue {
                " = 1"
            } else {
                " = 0"
            });
        }
        Operator::IsNotTrue | Operator::IsNotFalse => {
            out.push('(');
            out.push_str(expression);
            out.push_str(if operator == Operator::IsNotTrue {
                " <> 1 OR "
            } else {
                " <> 0 OR "
            });
            out.push_str(expression);
            out.push_str(" IS NULL)");
        }
        Operator::IsEmptyNumericId => {
            out.push('(');
            out.push_str(expression);
            out.push_str(" IS NULL OR ");
            out.push_str(expression);
            out.push_str(" = 0)");
        }
        _ => {
            return Err(QuarryError::validation(format!(
                "Operator `{operator}` requires a value"
            )));
        }
    }
    Ok(())
}

/// Coordinates of a geometry filter, read as `x1, y1, x2, y2, ...`.
///
/// `$box` takes two opposite corners, `$polygon` at least three vertices.
pub fn geometry_points(operator: Operator, values: &[Value]) -> Result<Vec<(f64, f64)>> {
    let valid = values.len() % 2 == 0
        && match operator {
            Operator::Box => values.len() == 4,
            Operator::Polygon => values.len() >= 6,
            _ => !values.is_empty(),
        };
    if !valid {
        return Err(QuarryError::validation(format!(
            "Operator `{operator}` got {} coordinates, `$box` takes 4 and `$polygon` at least 6 in x, y pairs",
            values.len()
        )));
    }
    values
        .chunks(2)
        .map(|point| {
            Ok((
                f64::try_from_value(point[0].clone())?,
                f64::try_from_value(point[1].clone())?,
            ))
        })
        .collect()
}
