use crate::{Dialect, GenericDialect, QuarryError, Result};
use std::{collections::BTreeMap, sync::Arc};

/// Dialect name to provider lookup.
///
/// Dialect crates expose their provider, the application registers the ones it
/// links: `DialectRegistry::new().with(PostgresDialect)`.
#[derive(Clone)]
pub struct DialectRegistry {
    dialects: BTreeMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// Registry holding only [`GenericDialect`].
    pub fn new() -> Self {
        Self::empty().with(GenericDialect)
    }

    pub fn empty() -> Self {
        Self {
            dialects: BTreeMap::new(),
        }
    }

    pub fn with(mut self, dialect: impl Dialect + 'static) -> Self {
        self.register(Arc::new(dialect));
        self
    }

    /// Adds or replaces the provider registered under `dialect.name()`.
    pub fn register(&mut self, dialect: Arc<dyn Dialect>) {
        self.dialects
            .insert(dialect.name().to_ascii_lowercase(), dialect);
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        self.dialects
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| {
                QuarryError::unsupported(
                    name,
                    format!(
                        "this session, no provider is registered (known: {})",
                        self.names().collect::<Vec<_>>().join(", ")
                    ),
                )
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let registry = DialectRegistry::new();
        assert_eq!(registry.get("GENERIC").unwrap().name(), "generic");
        let error = registry.get("db2").err().unwrap();
        assert!(matches!(
            QuarryError::of(&error),
            Some(QuarryError::UnsupportedDialect { dialect, .. }) if dialect == "db2"
        ));
    }
}
