mod predicate;
mod write;

use crate::{
    Column, Context, Dialect, Fragment, Params, QuarryError, Query, Result, SelectParts,
    Statement, Table, separated_by, util::split_path,
};
use log::trace;

/// A column reference inside a query: a column of the table, or a column of
/// a linked table reached through `relation`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolved<'t> {
    pub relation: Option<&'t Column>,
    pub column: &'t Column,
}

impl<'t> Resolved<'t> {
    fn same(&self, other: &Resolved) -> bool {
        std::ptr::eq(self.column, other.column)
            && self.relation.map(|v| v as *const _) == other.relation.map(|v| v as *const _)
    }
}

/// One projected column with its result label.
struct Projected<'t> {
    resolved: Resolved<'t>,
    label: Option<String>,
}

/// State of one compilation.
pub(crate) struct Build<'t> {
    pub context: Context,
    pub params: Params,
    /// Relation columns to join, in first reference order.
    pub joins: Vec<&'t Column>,
}

impl<'t> Build<'t> {
    fn join(&mut self, relation: &'t Column) {
        if !self.joins.iter().any(|v| std::ptr::eq(*v, relation)) {
            self.joins.push(relation);
        }
    }
}

/// Turns a [`Query`] against a resolved [`Table`] into parameterized SQL.
///
/// Filter fields name record fields (or columns), `relation.field` reaches a
/// column of a linked table and joins it with a `LEFT OUTER JOIN` aliased by
/// the relation column name. When anything is joined, every column is
/// qualified and the base table is aliased by its own name.
pub struct QueryCompiler<'a> {
    pub dialect: &'a dyn Dialect,
    pub table: &'a Table,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(dialect: &'a dyn Dialect, table: &'a Table) -> Self {
        Self { dialect, table }
    }

    fn build(&self) -> Build<'a> {
        Build {
            context: Context::new(Fragment::None, false, self.table.escape_reserved),
            params: Params::new(),
            joins: Vec::new(),
        }
    }

    /// Resolves a field name or a `relation.field` path.
    pub(crate) fn resolve(&self, path: &str) -> Result<Resolved<'a>> {
        let table = self.table;
        if let Some((relation, field)) = split_path(path) {
            let Some(relation) = table.column(relation).filter(|c| c.is_relation()) else {
                return Err(QuarryError::validation(format!(
                    "Table {} has no relation field `{relation}` (referenced by `{path}`)",
                    table.full_name()
                )));
            };
            let linked = relation.linked_columns();
            let column = linked
                .iter()
                .find(|c| c.field == field)
                .or_else(|| {
                    linked.iter().find(|c| {
                        c.name.eq_ignore_ascii_case(field) || c.field.eq_ignore_ascii_case(field)
                    })
                })
                .ok_or_else(|| {
                    QuarryError::validation(format!(
                        "Table {} has no field `{path}`",
                        table.full_name()
                    ))
                })?;
            return Ok(Resolved {
                relation: Some(relation),
                column,
            });
        }
        table
            .column(path)
            .map(|column| Resolved {
                relation: None,
                column,
            })
            .ok_or_else(|| {
                QuarryError::validation(format!(
                    "Table {} has no field `{path}`",
                    table.full_name()
                ))
            })
    }

    /// Resolves a path that must land on a scalar column, registering its join.
    fn resolve_scalar(&self, build: &mut Build<'a>, path: &str) -> Result<Resolved<'a>> {
        let resolved = self.resolve(path)?;
        if resolved.column.is_relation() {
            return Err(QuarryError::validation(format!(
                "Field `{path}` of table {} is a relation, name one of its fields as `{path}.field`",
                self.table.full_name()
            )));
        }
        if let Some(relation) = resolved.relation {
            build.join(relation);
        }
        Ok(resolved)
    }

    /// Rendered column reference.
    pub(crate) fn expression(&self, build: &mut Build, resolved: &Resolved) -> String {
        let mut out = String::new();
        let alias = match resolved.relation {
            Some(relation) => relation.name.as_str(),
            None => self.table.name.as_str(),
        };
        self.dialect
            .write_column(&mut build.context, &mut out, alias, &resolved.column.name);
        out
    }

    fn projection(&self, build: &mut Build<'a>, query: &Query) -> Result<Vec<Projected<'a>>> {
        let mut result = Vec::<Projected<'a>>::new();
        let mut push = |resolved: Resolved<'a>| {
            if result.iter().any(|v| v.resolved.same(&resolved)) {
                return;
            }
            let label = resolved
                .relation
                .map(|relation| format!("{}__{}", relation.name, resolved.column.name));
            result.push(Projected { resolved, label });
        };
        if !query.group.is_empty() {
            let group = query
                .group
                .iter()
                .map(|v| self.resolve_scalar(build, v))
                .collect::<Result<Vec<_>>>()?;
            for field in query.select.iter().chain(&query.extselect) {
                let resolved = self.resolve(field)?;
                if !group.iter().any(|g| g.same(&resolved)) {
                    return Err(QuarryError::validation(format!(
                        "Field `{field}` of table {} is not part of the group by ({})",
                        self.table.full_name(),
                        query.group.join(", ")
                    )));
                }
            }
            group.into_iter().for_each(&mut push);
            return Ok(result);
        }
        let explicit = if !query.select.is_empty() {
            query.select.iter().chain(&query.extselect).collect::<Vec<_>>()
        } else {
            let unselected = query
                .unselect
                .iter()
                .map(|v| self.resolve(v))
                .collect::<Result<Vec<_>>>()?;
            for column in self.table.scalar_columns() {
                let resolved = Resolved {
                    relation: None,
                    column,
                };
                if !unselected.iter().any(|v| v.same(&resolved)) {
                    push(resolved);
                }
            }
            query.extselect.iter().collect()
        };
        for field in explicit {
            let resolved = self.resolve(field)?;
            if resolved.column.is_relation() {
                build.join(resolved.column);
                for column in resolved.column.linked_columns() {
                    push(Resolved {
                        relation: Some(resolved.column),
                        column,
                    });
                }
            } else {
                if let Some(relation) = resolved.relation {
                    build.join(relation);
                }
                push(resolved);
            }
        }
        if result.is_empty() {
            return Err(QuarryError::validation(format!(
                "Nothing to select from table {}",
                self.table.full_name()
            )));
        }
        Ok(result)
    }

    /// Registers the joins needed by filters, grouping and ordering.
    fn scan(&self, build: &mut Build<'a>, query: &Query, ordered: bool) -> Result<()> {
        for filter in query.filters.leaves() {
            let resolved = self.resolve(&filter.left)?;
            if let Some(relation) = resolved.relation {
                build.join(relation);
            }
        }
        for field in &query.group {
            self.resolve_scalar(build, field)?;
        }
        if ordered {
            for order in &query.order {
                for (field, _) in order.expand() {
                    self.resolve_scalar(build, field)?;
                }
            }
        }
        Ok(())
    }

    fn validate(&self, query: &Query) -> Result<()> {
        let Some(lock) = query.lock else {
            return Ok(());
        };
        if !query.group.is_empty() {
            return Err(QuarryError::validation(format!(
                "Cannot lock the grouped query on table {}",
                self.table.full_name()
            )));
        }
        if !lock.with_no_lock && query.window()?.is_some() {
            return Err(QuarryError::validation(format!(
                "Cannot lock the rows of a paginated query on table {}, only the no-lock hint is allowed",
                self.table.full_name()
            )));
        }
        Ok(())
    }

    fn write_from(&self, build: &mut Build<'a>, out: &mut String, query: &Query) {
        let joined = !build.joins.is_empty();
        let mut updater = build.context.switch_fragment(Fragment::From);
        let context = &mut updater.current;
        self.dialect
            .write_table_name(context, out, &self.table.domain, &self.table.name);
        if joined {
            out.push(' ');
            self.dialect.write_identifier(context, out, &self.table.name);
        }
        if let Some(lock) = &query.lock {
            self.dialect.write_lock_table_hint(context, out, lock);
        }
        for relation in &build.joins {
            let Some(link) = &relation.relation else {
                continue;
            };
            context.fragment = Fragment::Join;
            out.push_str(" LEFT OUTER JOIN ");
            self.dialect
                .write_table_name(context, out, &link.linked.domain, &link.linked.name);
            out.push(' ');
            self.dialect.write_identifier(context, out, &relation.name);
            if let Some(lock) = &query.lock {
                self.dialect.write_lock_table_hint(context, out, lock);
            }
            out.push_str(" ON ");
            separated_by(
                out,
                link.linked.primary_key.iter().zip(&link.local_columns),
                |out, (key, local)| {
                    self.dialect.write_column(context, out, &relation.name, key);
                    out.push_str(" = ");
                    self.dialect
                        .write_column(context, out, &self.table.name, local);
                },
                " AND ",
            );
        }
    }

    fn write_group(&self, build: &mut Build<'a>, query: &Query) -> Result<String> {
        let mut out = String::new();
        for (i, field) in query.group.iter().enumerate() {
            let resolved = self.resolve_scalar(build, field)?;
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&self.expression(build, &resolved));
        }
        Ok(out)
    }

    fn write_order(&self, build: &mut Build<'a>, query: &Query) -> Result<String> {
        let mut out = String::new();
        for order in &query.order {
            for (field, ascending) in order.expand() {
                let resolved = self.resolve_scalar(build, field)?;
                if !out.is_empty() {
                    out.push_str(", ");
                }
                out.push_str(&self.expression(build, &resolved));
                out.push_str(if ascending { " ASC" } else { " DESC" });
            }
        }
        Ok(out)
    }

    fn write_projection(&self, build: &mut Build<'a>, projection: &[Projected<'a>]) -> String {
        let mut out = String::new();
        for (i, projected) in projection.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&self.expression(build, &projected.resolved));
            if let Some(label) = &projected.label {
                out.push_str(" AS ");
                self.dialect
                    .write_identifier(&mut build.context, &mut out, label);
            }
        }
        out
    }

    /// Everything but the head: FROM with joins, WHERE, GROUP BY.
    fn parts(
        &self,
        build: &mut Build<'a>,
        query: &Query,
        projection: Option<&[Projected<'a>]>,
        ordered: bool,
    ) -> Result<SelectParts> {
        build.context.qualify_columns = !build.joins.is_empty();
        let mut parts = SelectParts::default();
        if let Some(projection) = projection {
            build.context.fragment = Fragment::Select;
            parts.columns = self.write_projection(build, projection);
        }
        self.write_from(build, &mut parts.from, query);
        build.context.fragment = Fragment::Where;
        self.write_filters(build, &mut parts.filter, &query.filters)?;
        build.context.fragment = Fragment::GroupBy;
        parts.group = self.write_group(build, query)?;
        if ordered {
            build.context.fragment = Fragment::OrderBy;
            parts.order = self.write_order(build, query)?;
            parts.lock = query.lock;
        }
        Ok(parts)
    }

    fn finish(&self, build: Build, sql: String) -> Statement {
        trace!("Compiled for {}: {}", self.table.full_name(), sql);
        Statement {
            sql,
            params: build.params,
        }
    }

    /// Select statement with projection, joins, filters, grouping, ordering,
    /// locking and pagination.
    pub fn select(&self, query: &Query) -> Result<Statement> {
        self.validate(query)?;
        let mut build = self.build();
        let projection = self.projection(&mut build, query)?;
        self.scan(&mut build, query, true)?;
        let parts = self.parts(&mut build, query, Some(&projection), true)?;
        let window = query.window()?;
        let mut out = String::with_capacity(256);
        self.dialect
            .write_select(&mut build.context, &mut out, &parts, window);
        Ok(self.finish(build, out))
    }

    /// Number of rows (or groups) the query selects, ignoring paging, order and lock.
    pub fn count(&self, query: &Query) -> Result<Statement> {
        let query = query.unpaged();
        let mut build = self.build();
        let mut out = String::with_capacity(256);
        if query.group.is_empty() {
            self.scan(&mut build, &query, false)?;
            let mut parts = self.parts(&mut build, &query, None, false)?;
            parts.columns = "COUNT(*)".into();
            self.dialect
                .write_select(&mut build.context, &mut out, &parts, None);
        } else {
            let projection = self.projection(&mut build, &query)?;
            self.scan(&mut build, &query, false)?;
            let parts = self.parts(&mut build, &query, Some(&projection), false)?;
            out.push_str("SELECT COUNT(*) FROM (");
            self.dialect
                .write_select(&mut build.context, &mut out, &parts, None);
            out.push_str(") count__");
        }
        Ok(self.finish(build, out))
    }

    /// Deletes the rows matching the filters of the query, everything else is ignored.
    pub fn delete(&self, query: &Query) -> Result<Statement> {
        let query = Query {
            filters: query.filters.clone(),
            ..Default::default()
        };
        let mut build = self.build();
        self.scan(&mut build, &query, false)?;
        let mut out = String::with_capacity(128);
        if build.joins.is_empty() {
            build.context.fragment = Fragment::Delete;
            out.push_str("DELETE FROM ");
            self.dialect.write_table_name(
                &mut build.context,
                &mut out,
                &self.table.domain,
                &self.table.name,
            );
            let mut filter = String::new();
            build.context.fragment = Fragment::Where;
            self.write_filters(&mut build, &mut filter, &query.filters)?;
            if !filter.is_empty() {
                out.push_str(" WHERE ");
                out.push_str(&filter);
            }
            return Ok(self.finish(build, out));
        }
        let [key] = self.table.primary_key.as_slice() else {
            return Err(QuarryError::validation(format!(
                "Deleting from table {} through a relation filter requires a single column primary key",
                self.table.full_name()
            )));
        };
        let key = self.table.column_by_name(key).ok_or_else(|| {
            QuarryError::validation(format!(
                "Primary key column {key} of table {} is not mapped",
                self.table.full_name()
            ))
        })?;
        let projection = [Projected {
            resolved: Resolved {
                relation: None,
                column: key,
            },
            label: None,
        }];
        let parts = self.parts(&mut build, &query, Some(&projection), false)?;
        {
            let mut updater = build.context.switch_fragment(Fragment::Delete);
            let context = &mut updater.current;
            context.qualify_columns = false;
            out.push_str("DELETE FROM ");
            self.dialect
                .write_table_name(context, &mut out, &self.table.domain, &self.table.name);
            out.push_str(" WHERE ");
            self.dialect.write_identifier(context, &mut out, &key.name);
            out.push_str(" IN (SELECT ");
            self.dialect.write_identifier(context, &mut out, &key.name);
            out.push_str(" FROM (");
            self.dialect.write_select(context, &mut out, &parts, None);
            out.push_str(") d__)");
        }
        Ok(self.finish(build, out))
    }
}
