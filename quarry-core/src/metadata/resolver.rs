use crate::{
    Catalog, Column, ColumnInfo, DataType, Dialect, FieldDef, Introspection, MetadataCache,
    QuarryError, Record, RecordDef, Relation, Result, Table, TableKey, TableKind, ValueGenerator,
    metadata::naming::{candidates, simple_type_name},
};
use log::debug;
use std::{collections::BTreeMap, sync::Arc};

/// Builds [`Table`] descriptors from declared metadata and live introspection.
///
/// Every table is resolved at most once per cache: concurrent callers asking
/// for the same key wait for the same resolution. Relations are resolved one
/// level deep, the linked table holds scalar columns only.
pub struct Resolver<'a, C: Catalog> {
    pub catalog: &'a C,
    pub dialect: &'a dyn Dialect,
    /// Schemas probed in order when a record does not declare one.
    pub schemas: &'a [String],
    pub cache: &'a MetadataCache,
}

struct Located {
    schema: String,
    name: String,
    kind: TableKind,
}

fn is_unsupported(error: &crate::Error) -> bool {
    matches!(
        QuarryError::of(error),
        Some(QuarryError::UnsupportedDialect { .. })
    )
}

impl<'a, C: Catalog> Resolver<'a, C> {
    pub fn new(
        catalog: &'a C,
        dialect: &'a dyn Dialect,
        schemas: &'a [String],
        cache: &'a MetadataCache,
    ) -> Self {
        Self {
            catalog,
            dialect,
            schemas,
            cache,
        }
    }

    pub async fn record<R: Record>(&self) -> Result<Arc<Table>> {
        self.definition(R::record_def()).await
    }

    /// Table of a record type, relation columns included.
    pub async fn definition(&self, def: &'static RecordDef) -> Result<Arc<Table>> {
        let key = TableKey::Record((def.type_id)());
        self.cache
            .table(key, || async move {
                let base = self.scalar(def).await?;
                if !def.fields.iter().any(|f| !f.ignore && f.relation.is_some()) {
                    return Ok(base);
                }
                let mut columns = Vec::with_capacity(def.fields.len());
                for field in def.fields.iter().filter(|f| !f.ignore) {
                    if let Some(relation) = &field.relation {
                        columns.push(self.relation_column(def, &base, field, relation).await?);
                    } else if let Some(column) = base.columns.iter().find(|c| c.field == field.name) {
                        columns.push(column.clone());
                    }
                }
                let table = Table {
                    columns,
                    contains_linked_table: true,
                    ..(*base).clone()
                };
                Ok(Arc::new(table))
            })
            .await
    }

    /// Table of a record type with scalar columns only.
    pub async fn scalar(&self, def: &'static RecordDef) -> Result<Arc<Table>> {
        let key = TableKey::Linked((def.type_id)());
        self.cache
            .table(key, || async move { self.build_scalar(def).await.map(Arc::new) })
            .await
    }

    /// Table known only by name, columns come from introspection.
    pub async fn named(&self, name: &str) -> Result<Arc<Table>> {
        let key = TableKey::Named(name.to_lowercase());
        self.cache
            .table(key, || async move { self.build_named(name).await.map(Arc::new) })
            .await
    }

    async fn relation_column(
        &self,
        def: &'static RecordDef,
        base: &Table,
        field: &FieldDef,
        relation: &crate::RelationDef,
    ) -> Result<Column> {
        let linked = self.scalar((relation.linked)()).await?;
        if relation.local_columns.len() != linked.primary_key.len() {
            return Err(QuarryError::metadata(format!(
                "Relation {}.{} declares {} local columns ({}) but {} has {} primary key columns ({})",
                def.type_name,
                field.name,
                relation.local_columns.len(),
                relation.local_columns.join(", "),
                linked.full_name(),
                linked.primary_key.len(),
                linked.primary_key.join(", "),
            )));
        }
        let local = relation
            .local_columns
            .iter()
            .zip(linked.primary_key_columns())
            .map(|(name, key)| match base.column_by_name(name) {
                Some(column) => column.clone(),
                None => Column {
                    name: name.to_string(),
                    field: name.to_string(),
                    primary_key: false,
                    nullable: true,
                    generator: None,
                    relation: None,
                    ..key.clone()
                },
            })
            .collect();
        Ok(Column {
            name: field.column.unwrap_or(field.name).to_string(),
            field: field.name.to_string(),
            primary_key: false,
            data_type: DataType::Other,
            sql_type: String::new(),
            length: None,
            nullable: true,
            generator: None,
            relation: Some(Relation {
                linked,
                local_columns: relation.local_columns.iter().map(|v| v.to_string()).collect(),
                local,
            }),
        })
    }

    /// Probes `names` in each schema, tables before views.
    async fn locate(&self, type_name: &str, schemas: &[String], names: &[String]) -> Result<Located> {
        let mut tried = Vec::new();
        for schema in schemas {
            let mut probed = Vec::<String>::new();
            for name in names {
                tried.push(if schema.is_empty() {
                    name.clone()
                } else {
                    format!("{schema}.{name}")
                });
                let lower = name.to_lowercase();
                if probed.contains(&lower) {
                    continue;
                }
                probed.push(lower);
                for (query, kind) in [
                    (Introspection::TableExists, TableKind::Table),
                    (Introspection::ViewExists, TableKind::View),
                ] {
                    if self
                        .catalog
                        .exists(self.dialect, query, schema, name, None)
                        .await?
                    {
                        return Ok(Located {
                            schema: schema.clone(),
                            name: name.clone(),
                            kind,
                        });
                    }
                }
            }
        }
        Err(QuarryError::metadata(format!(
            "Cannot find a table or view for {type_name}, tried: {}",
            tried.join(", ")
        )))
    }

    fn schemas_for(&self, declared: Option<&str>) -> Vec<String> {
        match declared {
            Some(schema) => vec![schema.to_string()],
            None => self.schemas.to_vec(),
        }
    }

    async fn build_scalar(&self, def: &'static RecordDef) -> Result<Table> {
        let names = match def.table {
            Some(table) => vec![table.to_string()],
            None => candidates(simple_type_name(def.type_name)),
        };
        let located = self
            .locate(def.type_name, &self.schemas_for(def.schema), &names)
            .await?;
        let introspected = self
            .catalog
            .columns(self.dialect, &located.schema, &located.name)
            .await?;
        let mut primary_key = self
            .catalog
            .primary_key_columns(self.dialect, &located.schema, &located.name)
            .await?;
        let mut columns = Vec::with_capacity(def.fields.len());
        for field in def
            .fields
            .iter()
            .filter(|f| !f.ignore && f.relation.is_none())
        {
            let info = self.match_column(def, &located, field, &introspected)?;
            columns.push(Column {
                name: info.name.clone(),
                field: field.name.to_string(),
                primary_key: false,
                data_type: match DataType::from_sql_type(&info.sql_type) {
                    DataType::Other => field.value.data_type(),
                    v => v,
                },
                sql_type: info.sql_type.clone(),
                length: info.length.or(field.length),
                nullable: info.nullable,
                generator: None,
                relation: None,
            });
        }
        if primary_key.is_empty() {
            primary_key = def
                .fields
                .iter()
                .filter(|f| f.primary_key && !f.ignore)
                .filter_map(|f| columns.iter().find(|c| c.field == f.name))
                .map(|c| c.name.clone())
                .collect();
        }
        let mut generators = BTreeMap::new();
        for column in &mut columns {
            column.primary_key = primary_key.iter().any(|k| k.eq_ignore_ascii_case(&column.name));
            let Some(field) = def.field(&column.field) else {
                continue;
            };
            if !field.generated {
                continue;
            }
            let generator = self.generator(&located, field, column).await?;
            generators.insert(column.field.clone(), generator.clone());
            column.generator = Some(generator);
        }
        debug!(
            "Resolved {} {}.{} for {} with {} columns",
            located.kind,
            located.schema,
            located.name,
            def.type_name,
            columns.len()
        );
        Ok(Table {
            domain: located.schema,
            name: located.name,
            kind: located.kind,
            columns,
            primary_key,
            contains_linked_table: def.fields.iter().any(|f| f.relation.is_some()),
            generators,
            escape_reserved: def.escape_reserved,
            record: Some(def),
        })
    }

    fn match_column<'i>(
        &self,
        def: &RecordDef,
        located: &Located,
        field: &FieldDef,
        introspected: &'i [ColumnInfo],
    ) -> Result<&'i ColumnInfo> {
        let names = match field.column {
            Some(column) => vec![column.to_string()],
            None => candidates(field.name),
        };
        names
            .iter()
            .find_map(|name| {
                introspected
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| {
                QuarryError::metadata(format!(
                    "Cannot find a column for {}.{} in {} {}.{}, tried: {}",
                    def.type_name,
                    field.name,
                    located.kind,
                    located.schema,
                    located.name,
                    names.join(", ")
                ))
            })
    }

    async fn generator(
        &self,
        located: &Located,
        field: &FieldDef,
        column: &Column,
    ) -> Result<ValueGenerator> {
        match self
            .catalog
            .exists(
                self.dialect,
                Introspection::IdentityColumn,
                &located.schema,
                &located.name,
                Some(&column.name),
            )
            .await
        {
            Ok(true) => return Ok(ValueGenerator::Identity),
            Ok(false) => {}
            Err(e) if is_unsupported(&e) => {}
            Err(e) => return Err(e),
        }
        let sequence = field
            .sequence
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("{}_{}_seq", located.name, column.name));
        let (schemas, name) = match sequence.split_once('.') {
            Some((schema, name)) => (vec![schema.to_string()], name.to_string()),
            None => {
                let mut schemas = vec![located.schema.clone()];
                schemas.extend(self.schemas.iter().filter(|s| **s != located.schema).cloned());
                (schemas, sequence)
            }
        };
        for schema in &schemas {
            if self
                .catalog
                .exists(self.dialect, Introspection::SequenceExists, schema, &name, None)
                .await?
            {
                return Ok(ValueGenerator::Sequence {
                    schema: schema.clone(),
                    name,
                });
            }
        }
        Err(QuarryError::metadata(format!(
            "Column {}.{} is generated but is not an identity column and sequence {name} was not found in: {}",
            located.name,
            column.name,
            schemas.join(", ")
        )))
    }

    async fn build_named(&self, name: &str) -> Result<Table> {
        let (schemas, name) = match name.split_once('.') {
            Some((schema, name)) => (vec![schema.to_string()], name),
            None => (self.schemas.to_vec(), name),
        };
        let located = self.locate(name, &schemas, &[name.to_string()]).await?;
        let primary_key = self
            .catalog
            .primary_key_columns(self.dialect, &located.schema, &located.name)
            .await?;
        let columns = self
            .catalog
            .columns(self.dialect, &located.schema, &located.name)
            .await?
            .into_iter()
            .map(|info| Column {
                primary_key: primary_key.iter().any(|k| k.eq_ignore_ascii_case(&info.name)),
                field: info.name.clone(),
                data_type: DataType::from_sql_type(&info.sql_type),
                name: info.name,
                sql_type: info.sql_type,
                length: info.length,
                nullable: info.nullable,
                generator: None,
                relation: None,
            })
            .collect::<Vec<_>>();
        debug!(
            "Resolved {} {}.{} with {} columns",
            located.kind,
            located.schema,
            located.name,
            columns.len()
        );
        Ok(Table {
            domain: located.schema,
            name: located.name,
            kind: located.kind,
            columns,
            primary_key,
            contains_linked_table: false,
            generators: BTreeMap::new(),
            escape_reserved: false,
            record: None,
        })
    }
}
