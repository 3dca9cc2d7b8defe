//! Shared, observable bookmark store

use crate::event::{ItemRef, TreeEvent, TreeObserver};
use crate::tree::{now_ms, BookmarkTree, FolderId, ItemChange, ItemId, NewItem, TreeDocument};
use crate::Result;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Weak};

/// Thread-safe owner of a `BookmarkTree`
///
/// Every mutation emits the matching `TreeEvent` to registered observers once the
/// tree lock has been released, so observers may read the tree. Reordering done
/// by a sort engine goes through `write()` and emits nothing.
pub struct TreeStore {
    tree: RwLock<BookmarkTree>,
    observers: RwLock<Vec<Weak<dyn TreeObserver>>>,
    /// Nesting depth of `run_in_batch`
    batch_depth: Mutex<usize>,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new(BookmarkTree::new())
    }
}

impl TreeStore {
    pub fn new(tree: BookmarkTree) -> Self {
        Self {
            tree: RwLock::new(tree),
            observers: RwLock::new(Vec::new()),
            batch_depth: Mutex::new(0),
        }
    }

    /// Load a store from a JSON bookmark document
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let document: TreeDocument = serde_json::from_str(&contents)?;
        Ok(Self::new(BookmarkTree::from_document(document)?))
    }

    /// Save the tree as a JSON bookmark document
    pub fn save(&self, path: &Path) -> Result<()> {
        let document = self.tree.read().to_document();
        let data = serde_json::to_vec_pretty(&document)?;
        atomic_write(path, &data)
    }

    /// Register an observer; dropped observers are pruned lazily
    pub fn observe(&self, observer: Weak<dyn TreeObserver>) {
        self.observers.write().push(observer);
    }

    /// Read access to the tree
    pub fn read(&self) -> RwLockReadGuard<'_, BookmarkTree> {
        self.tree.read()
    }

    /// Write access for sort engines; does not notify observers
    pub fn write(&self) -> RwLockWriteGuard<'_, BookmarkTree> {
        self.tree.write()
    }

    /// Create an item
    pub fn add(&self, parent: FolderId, index: Option<usize>, new: NewItem) -> Result<ItemId> {
        let kind = new.kind;
        let id = self.tree.write().insert(parent, index, new, now_ms())?;
        self.emit(TreeEvent::Added(ItemRef::new(id, kind, parent)));
        Ok(id)
    }

    /// Move an item into `parent`
    pub fn move_item(&self, id: ItemId, parent: FolderId, index: Option<usize>) -> Result<()> {
        let kind = {
            let mut tree = self.tree.write();
            tree.relocate(id, parent, index, now_ms())?;
            tree.get(id).map(|item| item.kind)
        };
        if let Some(kind) = kind {
            self.emit(TreeEvent::Moved(ItemRef::new(id, kind, parent)));
        }
        Ok(())
    }

    /// Remove an item (and its subtree)
    pub fn remove(&self, id: ItemId) -> Result<()> {
        let removed = self.tree.write().detach(id)?;
        if let Some(item) = ItemRef::of(&removed) {
            self.emit(TreeEvent::Removed(item));
        }
        Ok(())
    }

    /// Edit item attributes
    pub fn change(&self, id: ItemId, change: ItemChange) -> Result<()> {
        let (item, new_folder) = {
            let mut tree = self.tree.write();
            let new_folder = tree.apply_change(id, change, now_ms())?;
            (tree.get(id).and_then(ItemRef::of), new_folder)
        };
        if let Some(item) = item {
            self.emit(TreeEvent::Changed {
                item,
                deleted: false,
                new_folder,
            });
        }
        Ok(())
    }

    /// Record a visit
    pub fn visit(&self, id: ItemId) -> Result<()> {
        let item = {
            let mut tree = self.tree.write();
            tree.record_visit(id, now_ms())?;
            tree.get(id).and_then(ItemRef::of)
        };
        if let Some(item) = item {
            self.emit(TreeEvent::Visited(item));
        }
        Ok(())
    }

    /// Run `f` as one bulk mutation; nested calls share the outermost batch
    pub fn run_in_batch<T>(&self, f: impl FnOnce(&Self) -> T) -> T {
        if self.enter_batch() {
            self.emit(TreeEvent::BeginBatch);
        }
        let result = f(self);
        if self.leave_batch() {
            self.emit(TreeEvent::EndBatch);
        }
        result
    }

    fn enter_batch(&self) -> bool {
        let mut depth = self.batch_depth.lock();
        *depth += 1;
        *depth == 1
    }

    fn leave_batch(&self) -> bool {
        let mut depth = self.batch_depth.lock();
        *depth = depth.saturating_sub(1);
        *depth == 0
    }

    fn emit(&self, event: TreeEvent) {
        let (live, dead) = {
            let observers = self.observers.read();
            let live: Vec<Arc<dyn TreeObserver>> =
                observers.iter().filter_map(Weak::upgrade).collect();
            let dead = live.len() != observers.len();
            (live, dead)
        };
        if dead {
            self.observers.write().retain(|observer| observer.strong_count() > 0);
        }

        tracing::trace!(?event, observers = live.len(), "tree event");
        for observer in live {
            observer.on_tree_event(&event);
        }
    }
}

/// Atomic write helper
///
/// Writes data to a temporary file next to the target, fsyncs it, then renames it
/// over the target path.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(target)?;
    Ok(())
}
