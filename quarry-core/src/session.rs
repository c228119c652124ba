use crate::{
    AsValue, Condition, Dialect, DialectRegistry, DynamicRecord, Executor, FieldMap, KeyCase,
    MetadataCache, Page, QuarryError, Query, QueryCompiler, Record, Resolver, Result, RowLabeled,
    RowsAffected, SessionConfig, Statement, StatementKind, Table, TableKey, ValueGenerator,
    materialize, materialize_value,
    stream::TryStreamExt,
};
use log::{debug, info};
use std::{any::TypeId, pin::pin, sync::Arc};

/// Entry point: typed queries and writes over an [`Executor`].
///
/// A session owns its [`MetadataCache`]. Sessions of the same database can
/// share one through [`Session::with_cache`].
pub struct Session<E: Executor> {
    executor: E,
    dialect: Arc<dyn Dialect>,
    schemas: Vec<String>,
    key_case: KeyCase,
    cache: Arc<MetadataCache>,
}

impl<E: Executor> Session<E> {
    /// Fails when the configured dialect is not registered.
    pub fn new(executor: E, config: &SessionConfig, registry: &DialectRegistry) -> Result<Self> {
        let dialect = registry.get(&config.dialect)?;
        let schemas = if !config.schemas.is_empty() {
            config.schemas.clone()
        } else if !dialect.default_schema().is_empty() {
            vec![dialect.default_schema().to_string()]
        } else if let Some(database) = &config.database {
            vec![database.clone()]
        } else {
            return Err(QuarryError::validation(format!(
                "No schema configured for dialect {}, set the `schemas` parameter",
                dialect.name()
            )));
        };
        Ok(Self {
            executor,
            dialect,
            schemas,
            key_case: config.key_case,
            cache: Arc::new(MetadataCache::new()),
        })
    }

    pub fn with_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_dyn()
    }

    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    fn resolver(&self) -> Resolver<'_, E> {
        Resolver::new(&self.executor, self.dialect.as_dyn(), &self.schemas, &self.cache)
    }

    fn compiler<'s>(&'s self, table: &'s Table) -> QueryCompiler<'s> {
        QueryCompiler::new(self.dialect.as_dyn(), table)
    }

    /// Resolved table of `R`.
    pub async fn table<R: Record>(&self) -> Result<Arc<Table>> {
        self.resolver().record::<R>().await
    }

    /// Resolved table known only by name (`name` or `schema.name`).
    pub async fn named_table(&self, name: &str) -> Result<Arc<Table>> {
        self.resolver().named(name).await
    }

    fn field_map<R: Record>(&self, table: &Table) -> Arc<FieldMap> {
        self.cache
            .field_map(TypeId::of::<R>(), || FieldMap::new(R::record_def(), table))
    }

    async fn rows(&self, statement: Statement) -> Result<Vec<RowLabeled>> {
        debug!("{statement}");
        self.executor.fetch(statement).try_collect().await
    }

    async fn first_row(&self, statement: Statement) -> Result<Option<RowLabeled>> {
        debug!("{statement}");
        let mut stream = pin!(self.executor.fetch(statement));
        stream.try_next().await
    }

    async fn execute(&self, statement: Statement) -> Result<RowsAffected> {
        debug!("{statement}");
        self.executor.execute(statement).await
    }

    async fn count(&self, table: &Table, query: &Query) -> Result<u64> {
        let statement = self.compiler(table).count(query)?;
        match self.first_row(statement).await? {
            Some(row) => materialize_value(row),
            None => Ok(0),
        }
    }

    /// First record matching the condition, usually a primary key.
    pub async fn select<R: Record>(&self, condition: impl Into<Condition>) -> Result<Option<R>> {
        let table = self.table::<R>().await?;
        let query = condition.into().into_query(&table)?;
        let statement = self.compiler(&table).select(&query)?;
        let map = self.field_map::<R>(&table);
        self.first_row(statement)
            .await?
            .map(|row| materialize(&map, row))
            .transpose()
    }

    pub async fn select_list<R: Record>(&self, condition: impl Into<Condition>) -> Result<Vec<R>> {
        let table = self.table::<R>().await?;
        let query = condition.into().into_query(&table)?;
        let statement = self.compiler(&table).select(&query)?;
        let map = self.field_map::<R>(&table);
        self.rows(statement)
            .await?
            .into_iter()
            .map(|row| materialize(&map, row))
            .collect()
    }

    /// The page selected by `query`, with the total size of the unpaged result.
    pub async fn select_page<R: Record>(&self, query: Query) -> Result<Page<R>> {
        let table = self.table::<R>().await?;
        let total = self.count(&table, &query).await?;
        let statement = self.compiler(&table).select(&query)?;
        let map = self.field_map::<R>(&table);
        let items = self
            .rows(statement)
            .await?
            .into_iter()
            .map(|row| materialize(&map, row))
            .collect::<Result<Vec<R>>>()?;
        Ok(Page::new(&query, total, items))
    }

    /// Number of rows (or groups) matching the condition.
    pub async fn select_size<R: Record>(&self, condition: impl Into<Condition>) -> Result<u64> {
        let table = self.table::<R>().await?;
        let query = condition.into().into_query(&table)?;
        self.count(&table, &query).await
    }

    /// First projected column of every row, usually with `Query::select` naming one field.
    pub async fn select_values<R: Record, T: AsValue>(
        &self,
        condition: impl Into<Condition>,
    ) -> Result<Vec<T>> {
        let table = self.table::<R>().await?;
        let query = condition.into().into_query(&table)?;
        let statement = self.compiler(&table).select(&query)?;
        self.rows(statement)
            .await?
            .into_iter()
            .map(materialize_value)
            .collect()
    }

    /// Rows of a table without record type, keys cased by the configured [`KeyCase`].
    pub async fn select_maps(
        &self,
        table: &str,
        condition: impl Into<Condition>,
    ) -> Result<Vec<DynamicRecord>> {
        let table = self.named_table(table).await?;
        let query = condition.into().into_query(&table)?;
        let statement = self.compiler(&table).select(&query)?;
        Ok(self
            .rows(statement)
            .await?
            .into_iter()
            .map(|row| DynamicRecord::from_row(row, self.key_case))
            .collect())
    }

    fn write_sql<R: Record>(&self, table: &Table, kind: StatementKind) -> Result<Arc<str>> {
        self.cache
            .statement(TableKey::Record(TypeId::of::<R>()), kind, || {
                self.compiler(table).write_statement(kind)
            })
    }

    /// Assigns the next sequence value to the generated fields still null.
    async fn fill_sequences<R: Record>(&self, table: &Table, record: &mut R) -> Result<()> {
        for (field, generator) in &table.generators {
            let ValueGenerator::Sequence { schema, name } = generator else {
                continue;
            };
            if !record.get_field(field).is_none_or(|v| v.is_null()) {
                continue;
            }
            let mut sql = String::new();
            let mut context = Default::default();
            self.dialect
                .write_sequence_next_value(&mut context, &mut sql, schema, name)?;
            let value = self
                .first_row(Statement::new(sql))
                .await?
                .and_then(|row| row.values.into_vec().into_iter().next())
                .ok_or_else(|| {
                    QuarryError::metadata(format!("Sequence {schema}.{name} returned no value"))
                })?;
            record.set_field(field, value)?;
        }
        Ok(())
    }

    /// Writes the identity generated by the database back into the record.
    fn fill_identity<R: Record>(table: &Table, record: &mut R, affected: &RowsAffected) -> Result<()> {
        let Some(id) = affected.last_affected_id else {
            return Ok(());
        };
        for (field, generator) in &table.generators {
            if *generator == ValueGenerator::Identity
                && record.get_field(field).is_none_or(|v| v.is_null())
            {
                record.set_field(field, id.as_value())?;
            }
        }
        Ok(())
    }

    /// Inserts the record, generated values are written back into it.
    pub async fn insert<R: Record>(&self, record: &mut R) -> Result<RowsAffected> {
        let table = self.table::<R>().await?;
        self.fill_sequences(&table, record).await?;
        let sql = self.write_sql::<R>(&table, StatementKind::Insert)?;
        let params = self
            .compiler(&table)
            .record_params(&*record, StatementKind::Insert)?;
        let affected = self
            .execute(Statement {
                sql: sql.to_string(),
                params,
            })
            .await?;
        Self::fill_identity(&table, record, &affected)?;
        Ok(affected)
    }

    pub async fn insert_batch<R: Record>(&self, records: &mut [R]) -> Result<RowsAffected> {
        let table = self.table::<R>().await?;
        let sql = self.write_sql::<R>(&table, StatementKind::Insert)?;
        let mut params = Vec::with_capacity(records.len());
        for record in records.iter_mut() {
            self.fill_sequences(&table, record).await?;
            params.push(
                self.compiler(&table)
                    .record_params(&*record, StatementKind::Insert)?,
            );
        }
        debug!("{} x{}", sql, records.len());
        let results = self.executor.execute_batch(sql.to_string(), params).await?;
        let mut total = RowsAffected::default();
        for (record, affected) in records.iter_mut().zip(&results) {
            Self::fill_identity(&table, record, affected)?;
        }
        total.extend(results);
        Ok(total)
    }

    fn not_found<R: Record>(&self, table: &Table, params: &crate::Params) -> crate::Error {
        let key = self.compiler(table).describe_key(params);
        let type_name = R::record_def().type_name;
        info!("No {type_name} found in {} with primary key ({key})", table.full_name());
        QuarryError::NotFound {
            type_name: type_name.to_string(),
            key,
        }
        .into()
    }

    async fn write_by_key<R: Record>(&self, record: &R, kind: StatementKind) -> Result<RowsAffected> {
        let table = self.table::<R>().await?;
        let sql = self.write_sql::<R>(&table, kind)?;
        let params = self.compiler(&table).record_params(record, kind)?;
        let affected = self
            .execute(Statement {
                sql: sql.to_string(),
                params: params.clone(),
            })
            .await?;
        if affected.rows_affected == 0 {
            return Err(self.not_found::<R>(&table, &params));
        }
        Ok(affected)
    }

    async fn write_batch_by_key<R: Record>(
        &self,
        records: &[R],
        kind: StatementKind,
    ) -> Result<RowsAffected> {
        let table = self.table::<R>().await?;
        let sql = self.write_sql::<R>(&table, kind)?;
        let compiler = self.compiler(&table);
        let params = records
            .iter()
            .map(|r| compiler.record_params(r, kind))
            .collect::<Result<Vec<_>>>()?;
        debug!("{} x{}", sql, records.len());
        let results = self
            .executor
            .execute_batch(sql.to_string(), params.clone())
            .await?;
        if let Some((params, _)) = params
            .iter()
            .zip(&results)
            .find(|(_, v)| v.rows_affected == 0)
        {
            return Err(self.not_found::<R>(&table, params));
        }
        let mut total = RowsAffected::default();
        total.extend(results);
        Ok(total)
    }

    /// Updates every non key column, fails with `NotFound` when no row has the key.
    pub async fn update<R: Record>(&self, record: &R) -> Result<RowsAffected> {
        self.write_by_key(record, StatementKind::Update).await
    }

    pub async fn update_batch<R: Record>(&self, records: &[R]) -> Result<RowsAffected> {
        self.write_batch_by_key(records, StatementKind::Update).await
    }

    /// Deletes by primary key, fails with `NotFound` when no row has the key.
    pub async fn delete<R: Record>(&self, record: &R) -> Result<RowsAffected> {
        self.write_by_key(record, StatementKind::Delete).await
    }

    pub async fn delete_batch<R: Record>(&self, records: &[R]) -> Result<RowsAffected> {
        self.write_batch_by_key(records, StatementKind::Delete).await
    }

    fn generated_key_missing<R: Record>(table: &Table, record: &R) -> bool {
        table.primary_key_columns().any(|c| {
            c.generator.is_some() && record.get_field(&c.field).is_none_or(|v| v.is_null())
        })
    }

    /// Inserts or updates by primary key, a record without its generated key is inserted.
    pub async fn upsert<R: Record>(&self, record: &mut R) -> Result<RowsAffected> {
        let table = self.table::<R>().await?;
        if Self::generated_key_missing(&table, record) {
            return self.insert(record).await;
        }
        let sql = self.write_sql::<R>(&table, StatementKind::Upsert)?;
        let params = self
            .compiler(&table)
            .record_params(&*record, StatementKind::Upsert)?;
        self.execute(Statement {
            sql: sql.to_string(),
            params,
        })
        .await
    }

    pub async fn upsert_batch<R: Record>(&self, records: &mut [R]) -> Result<RowsAffected> {
        let table = self.table::<R>().await?;
        let mut total = RowsAffected::default();
        let (missing, present): (Vec<_>, Vec<_>) = records
            .iter_mut()
            .partition(|r| Self::generated_key_missing(&table, &**r));
        for record in missing {
            total.extend([self.insert(record).await?]);
        }
        if present.is_empty() {
            return Ok(total);
        }
        let sql = self.write_sql::<R>(&table, StatementKind::Upsert)?;
        let compiler = self.compiler(&table);
        let params = present
            .iter()
            .map(|r| compiler.record_params(&**r, StatementKind::Upsert))
            .collect::<Result<Vec<_>>>()?;
        debug!("{} x{}", sql, present.len());
        total.extend(self.executor.execute_batch(sql.to_string(), params).await?);
        Ok(total)
    }

    /// Deletes every row matching the condition, returns how many.
    pub async fn delete_list<R: Record>(&self, condition: impl Into<Condition>) -> Result<u64> {
        let table = self.table::<R>().await?;
        let query = condition.into().into_query(&table)?;
        let statement = self.compiler(&table).delete(&query)?;
        Ok(self.execute(statement).await?.rows_affected)
    }
}
