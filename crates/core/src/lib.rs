//! Bookmark tree model and sorting for Autosort
//!
//! This crate provides:
//! - Item/folder data model with the Places roots (menu, toolbar, unsorted)
//! - Mutation notifications (`TreeEvent`) and the `TreeObserver` seam
//! - Sort criteria derived from integer preference encodings
//! - The `SortEngine` seam and an in-memory comparator implementation

pub mod criteria;
pub mod engine;
pub mod error;
pub mod event;
pub mod sort;
pub mod store;
pub mod tree;

// Re-exports
pub use criteria::{CriteriaConfigurator, RootSet, SortCriteria, SortKey, SortScope};
pub use engine::SortEngine;
pub use error::{ConfigurationError, TreeError};
pub use event::{ItemRef, TreeEvent, TreeObserver};
pub use sort::TreeSorter;
pub use store::TreeStore;
pub use tree::{BookmarkTree, FolderId, Item, ItemChange, ItemId, ItemKind, NewItem, RootFolder};

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;
