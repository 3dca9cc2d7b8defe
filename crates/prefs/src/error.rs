//! Preference and migration errors

use crate::value::{CoercionError, PrefType};
use sort_core::{ConfigurationError, TreeError};
use thiserror::Error;

/// Errors raised by the preference store
#[derive(Debug, Error)]
pub enum PrefError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("preference '{name}' holds {expected} values, got {found}")]
    TypeMismatch {
        name: String,
        expected: PrefType,
        found: PrefType,
    },

    #[error("preference '{0}' has no value")]
    Missing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed preference file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render preferences: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("failed to persist preferences: {0}")]
    Persist(#[from] TreeError),
}

/// Errors raised while migrating one legacy preference
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("legacy preference '{name}' is not valid JSON: {source}")]
    Parse {
        name: String,
        source: serde_json::Error,
    },

    #[error("legacy preference '{name}' is not a flat JSON array or object matching its mapping")]
    Shape { name: String },

    #[error("legacy preference '{name}': {source}")]
    Coercion {
        name: String,
        source: CoercionError,
    },

    #[error(transparent)]
    Store(#[from] PrefError),
}
