//! Tree mutation notifications

use crate::tree::{FolderId, Item, ItemId, ItemKind};

/// The part of an item a notification carries: enough to route it without reading the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRef {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Containing folder at notification time (destination folder for moves)
    pub folder: FolderId,
}

impl ItemRef {
    pub fn new(id: ItemId, kind: ItemKind, folder: FolderId) -> Self {
        Self { id, kind, folder }
    }

    /// Snapshot of a tree item; `None` for the hidden root
    pub fn of(item: &Item) -> Option<Self> {
        Some(Self::new(item.id, item.kind, item.folder()?))
    }

    /// Folder whose order this item belongs to
    pub fn folder(&self) -> FolderId {
        self.folder
    }
}

/// A mutation notification emitted by the tree store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// A bulk mutation span starts
    BeginBatch,
    /// The bulk mutation span ends
    EndBatch,
    Added(ItemRef),
    Changed {
        item: ItemRef,
        /// The item was deleted by the time the change was delivered
        deleted: bool,
        /// The item is a folder still being set up by its creator
        new_folder: bool,
    },
    Moved(ItemRef),
    Removed(ItemRef),
    Visited(ItemRef),
}

impl TreeEvent {
    /// Item the notification is about, if any
    pub fn item(&self) -> Option<&ItemRef> {
        match self {
            TreeEvent::BeginBatch | TreeEvent::EndBatch => None,
            TreeEvent::Added(item)
            | TreeEvent::Moved(item)
            | TreeEvent::Removed(item)
            | TreeEvent::Visited(item)
            | TreeEvent::Changed { item, .. } => Some(item),
        }
    }
}

/// Receiver of tree mutation notifications
///
/// Called synchronously on the mutating thread after the store released its lock.
pub trait TreeObserver: Send + Sync {
    fn on_tree_event(&self, event: &TreeEvent);
}
