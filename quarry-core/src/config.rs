use crate::{KeyCase, Result, truncate_long};
use anyhow::Context;
use std::env;
use url::Url;
use urlencoding::decode;

/// Settings of a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Registry name of the dialect.
    pub dialect: String,
    /// Schemas probed in order, empty means the dialect default.
    pub schemas: Vec<String>,
    /// Database named by the URL path, the schema of last resort.
    pub database: Option<String>,
    pub key_case: KeyCase,
}

impl SessionConfig {
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            schemas: Vec::new(),
            database: None,
            key_case: KeyCase::AsIs,
        }
    }

    /// Parses `dialect://[user@]host[:port]/database?schemas=a,b&key_case=camel`.
    ///
    /// `schemas` and `key_case` fall back to the `QUARRY_SCHEMAS` and
    /// `QUARRY_KEY_CASE` environment variables.
    ///
    /// ```rust
    /// use quarry_core::{KeyCase, SessionConfig};
    /// let config = SessionConfig::from_url("postgres://localhost/shop?schemas=public,sales&key_case=camel").unwrap();
    /// assert_eq!(config.dialect, "postgres");
    /// assert_eq!(config.schemas, vec!["public", "sales"]);
    /// assert_eq!(config.key_case, KeyCase::Camel);
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let context = || format!("While parsing the session url `{}`", truncate_long!(url));
        let url = Url::parse(url).with_context(context)?;
        let param = |key: &str, env_var: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
                .or_else(|| env::var(env_var).ok())
        };
        let schemas = param("schemas", "QUARRY_SCHEMAS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let key_case = match param("key_case", "QUARRY_KEY_CASE") {
            Some(v) => KeyCase::parse(&v).with_context(context)?,
            None => KeyCase::AsIs,
        };
        let database = url
            .path_segments()
            .and_then(|mut v| v.next())
            .filter(|v| !v.is_empty())
            .map(|v| decode(v).map(|v| v.into_owned()))
            .transpose()
            .with_context(context)?;
        Ok(Self {
            dialect: url.scheme().to_string(),
            schemas,
            database,
            key_case,
        })
    }

    pub fn with_schemas<S: Into<String>>(mut self, schemas: impl IntoIterator<Item = S>) -> Self {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_database_and_encoding() {
        let config = SessionConfig::from_url("mysql://root@localhost:3306/my%20shop").unwrap();
        assert_eq!(config.dialect, "mysql");
        assert_eq!(config.database.as_deref(), Some("my shop"));
        assert_eq!(config.key_case, KeyCase::AsIs);
    }

    #[test]
    fn bad_key_case() {
        assert!(SessionConfig::from_url("sqlite://db?key_case=shouting").is_err());
    }
}
