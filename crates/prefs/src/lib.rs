//! Preference storage and migration for Autosort
//!
//! This crate provides:
//! - Typed key-value preference store with change observers
//! - Inclusive numeric bounds enforced on every write
//! - One-shot migration of legacy preferences (flat and JSON-structured)
//! - Option schema, first-run handling, TOML persistence

pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod migrate;
pub mod options;
pub mod store;
pub mod value;

// Re-exports
pub use error::{MigrationError, PrefError};
pub use guard::{BoundKind, Bounds, PreferenceGuard};
pub use migrate::{FieldKey, PreferenceMigrator, StructuredMapping};
pub use options::option_name;
pub use store::{PrefStore, PreferenceObserver};
pub use value::{CoercionError, PrefType, PrefValue};

/// Result type for preference operations
pub type Result<T> = std::result::Result<T, PrefError>;
