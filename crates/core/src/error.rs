//! Error types shared across the workspace

use crate::tree::{FolderId, ItemId};
use thiserror::Error;

/// Invalid configuration, reported synchronously where it is registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A sort key index does not name a key in the enumeration
    #[error("sort key index {index} is out of range (0..{len})")]
    SortKeyOutOfRange { index: i64, len: usize },

    /// A preference would end up with its minimum above its maximum
    #[error("preference '{name}' has minimum {min} greater than maximum {max}")]
    InvertedBounds { name: String, min: i64, max: i64 },
}

/// Errors raised by the bookmark tree store
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    #[error("item {0} is not a folder")]
    NotAFolder(ItemId),

    #[error("cannot move item {item} into folder {target}")]
    InvalidMove { item: ItemId, target: FolderId },

    #[error("root folder {0} cannot be moved or removed")]
    ProtectedRoot(ItemId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed bookmark document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to persist bookmark document: {0}")]
    Persist(#[from] tempfile::PersistError),
}
