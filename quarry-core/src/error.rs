use thiserror::Error;

/// Failures raised by Quarry itself.
///
/// They travel inside [`crate::Error`] (an `anyhow::Error`); use
/// `error.downcast_ref::<QuarryError>()` to classify them. Errors coming from
/// the [`crate::Executor`] are never wrapped and surface exactly as the driver
/// produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuarryError {
    /// Malformed condition, relation reference or incompatible query options.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An update or delete by primary key matched no row.
    #[error("No {type_name} found with primary key ({key})")]
    NotFound { type_name: String, key: String },

    /// Table, column or sequence could not be located, or a relation is inconsistent.
    #[error("Metadata resolution error: {0}")]
    MetadataResolution(String),

    /// The active dialect has no implementation for a required capability.
    #[error("Dialect `{dialect}` does not support {capability}")]
    UnsupportedDialect {
        dialect: String,
        capability: String,
    },
}

impl QuarryError {
    pub fn validation(message: impl Into<String>) -> crate::Error {
        QuarryError::Validation(message.into()).into()
    }

    pub fn metadata(message: impl Into<String>) -> crate::Error {
        QuarryError::MetadataResolution(message.into()).into()
    }

    pub fn unsupported(dialect: &str, capability: impl Into<String>) -> crate::Error {
        QuarryError::UnsupportedDialect {
            dialect: dialect.into(),
            capability: capability.into(),
        }
        .into()
    }

    /// Returns the Quarry classification of `error`, if it has one.
    pub fn of(error: &crate::Error) -> Option<&QuarryError> {
        error.downcast_ref::<QuarryError>()
    }
}
