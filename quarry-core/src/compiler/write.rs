use super::QueryCompiler;
use crate::{
    Column, Context, Fields, Fragment, Params, QuarryError, Result, StatementKind,
    ValueGenerator, WriteParts, util::parameter_base,
};

impl<'a> QueryCompiler<'a> {
    /// Columns written by inserts: scalar columns, identity columns excluded
    /// unless `with_identity`, then the relation local columns no scalar maps.
    fn written_columns(&self, with_identity: bool) -> Vec<&'a str> {
        let mut result = Vec::<&'a str>::new();
        for column in self.table.scalar_columns() {
            if !with_identity && column.generator == Some(ValueGenerator::Identity) {
                continue;
            }
            result.push(&column.name);
        }
        for column in self.table.columns.iter() {
            let Some(relation) = &column.relation else {
                continue;
            };
            for local in &relation.local_columns {
                if !result.iter().any(|v| v.eq_ignore_ascii_case(local))
                    && self.table.column_by_name(local).is_none()
                {
                    result.push(local);
                }
            }
        }
        result
    }

    fn keys(&self) -> Result<Vec<&'a str>> {
        if self.table.primary_key.is_empty() {
            return Err(QuarryError::validation(format!(
                "Table {} has no primary key",
                self.table.full_name()
            )));
        }
        Ok(self.table.primary_key.iter().map(String::as_str).collect())
    }

    /// Parts of a write statement of `kind`.
    pub fn write_parts(&self, kind: StatementKind) -> Result<WriteParts<'a>> {
        let table = self.table;
        let (columns, keys) = match kind {
            StatementKind::Insert => (self.written_columns(false), Vec::new()),
            StatementKind::Upsert => (self.written_columns(true), self.keys()?),
            StatementKind::Update => {
                let keys = self.keys()?;
                let columns = self
                    .written_columns(false)
                    .into_iter()
                    .filter(|c| !keys.iter().any(|k| k.eq_ignore_ascii_case(c)))
                    .collect::<Vec<_>>();
                if columns.is_empty() {
                    return Err(QuarryError::validation(format!(
                        "Table {} has no column to update outside of its primary key",
                        table.full_name()
                    )));
                }
                (columns, keys)
            }
            StatementKind::Delete => (Vec::new(), self.keys()?),
        };
        Ok(WriteParts {
            schema: &table.domain,
            table: &table.name,
            columns,
            keys,
        })
    }

    /// Write statement with one `:column` parameter per column.
    pub fn write_statement(&self, kind: StatementKind) -> Result<String> {
        let parts = self.write_parts(kind)?;
        let fragment = match kind {
            StatementKind::Insert | StatementKind::Upsert => Fragment::Insert,
            StatementKind::Update => Fragment::Update,
            StatementKind::Delete => Fragment::Delete,
        };
        let mut context = Context::new(fragment, false, self.table.escape_reserved);
        let mut out = String::with_capacity(128);
        match kind {
            StatementKind::Insert => self.dialect.write_insert(&mut context, &mut out, &parts),
            StatementKind::Update => self.dialect.write_update(&mut context, &mut out, &parts),
            StatementKind::Delete => self.dialect.write_delete(&mut context, &mut out, &parts),
            StatementKind::Upsert => self.dialect.write_upsert(&mut context, &mut out, &parts)?,
        }
        Ok(out)
    }

    /// Parameters of a record for the write statement of `kind`: scalar
    /// columns, then relation local columns taken from the linked record
    /// primary key.
    pub fn record_params(&self, record: &dyn Fields, kind: StatementKind) -> Result<Params> {
        let parts = self.write_parts(kind)?;
        let mut params = Params::new();
        for column in self.table.scalar_columns() {
            let value = record
                .get_field(&column.field)
                .unwrap_or_default();
            params.insert(parameter_base(&column.name).into_owned(), value);
        }
        for column in self.table.columns.iter() {
            let Some(relation) = &column.relation else {
                continue;
            };
            let linked = record.linked(&column.field);
            let keys = relation.linked.primary_key_columns().collect::<Vec<&Column>>();
            for (local, key) in relation.local_columns.iter().zip(keys) {
                let value = linked
                    .and_then(|v| v.get_field(&key.field))
                    .unwrap_or_default();
                params
                    .entry(parameter_base(local).into_owned())
                    .or_insert(value);
            }
        }
        params.retain(|name, _| {
            parts
                .columns
                .iter()
                .chain(&parts.keys)
                .any(|c| parameter_base(c) == name.as_str())
        });
        Ok(params)
    }

    /// `column=value` list of the primary key, for error messages.
    pub fn describe_key(&self, params: &Params) -> String {
        self.table
            .primary_key
            .iter()
            .map(|k| {
                let value = params
                    .get(parameter_base(k).as_ref())
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "NULL".into());
                format!("{k}={value}")
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
