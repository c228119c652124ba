use crate::{FieldMap, Result, Table, TableKey};
use dashmap::DashMap;
use std::{any::TypeId, future::Future, hash::Hash, sync::Arc};
use tokio::sync::OnceCell;

/// One computation in flight per key, every caller receives its result.
///
/// Concurrent first callers await the same cell. A failed computation leaves
/// the cell empty, the next caller runs it again. Completed values are read
/// without waiting.
pub struct SingleFlight<K, V> {
    cells: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> SingleFlight<K, V> {
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    pub async fn get_or_try_init<F, Fut>(&self, key: K, init: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = self.cells.entry(key).or_default().clone();
        cell.get_or_try_init(init).await.cloned()
    }

    /// Completed value, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        self.cells.get(key).and_then(|v| v.get().cloned())
    }

    /// Number of completed values.
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|v| v.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of a memoized write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Upsert,
    Delete,
}

/// Everything derived from schema metadata, for one database configuration.
///
/// Entries are written once and never invalidated: schema changes need a new
/// cache. Sessions share a cache by cloning its `Arc`.
#[derive(Default)]
pub struct MetadataCache {
    tables: SingleFlight<TableKey, Arc<Table>>,
    statements: DashMap<(TableKey, StatementKind), Arc<str>>,
    field_maps: DashMap<TypeId, Arc<FieldMap>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn table<F, Fut>(&self, key: TableKey, resolve: F) -> Result<Arc<Table>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<Table>>>,
    {
        self.tables.get_or_try_init(key, resolve).await
    }

    /// Already resolved table.
    pub fn cached_table(&self, key: &TableKey) -> Option<Arc<Table>> {
        self.tables.get(key)
    }

    pub fn tables_len(&self) -> usize {
        self.tables.len()
    }

    pub fn statement(
        &self,
        key: TableKey,
        kind: StatementKind,
        render: impl FnOnce() -> Result<String>,
    ) -> Result<Arc<str>> {
        Ok(self
            .statements
            .entry((key, kind))
            .or_try_insert_with(|| render().map(Into::into))?
            .clone())
    }

    pub fn field_map(&self, type_id: TypeId, build: impl FnOnce() -> FieldMap) -> Arc<FieldMap> {
        self.field_maps
            .entry(type_id)
            .or_insert_with(|| Arc::new(build()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn failed_init_is_retried() {
        let flight = SingleFlight::<u8, u32>::new();
        let calls = AtomicUsize::new(0);
        let result = flight
            .get_or_try_init(1, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::msg("boom"))
            })
            .await;
        assert!(result.is_err());
        assert!(flight.is_empty());
        let value = flight
            .get_or_try_init(1, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        let value = flight
            .get_or_try_init(1, || async { Ok(8) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
