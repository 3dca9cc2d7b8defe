//! Comparator-based sort engine over a `TreeStore`

use crate::criteria::{SortCriteria, SortKey, SortScope};
use crate::engine::SortEngine;
use crate::store::TreeStore;
use crate::tree::{BookmarkTree, FolderId, Item, ItemId, ItemKind, RootFolder};
use anyhow::Result;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::debug;

/// Sorts folders of a shared tree with the multi-key comparator
///
/// Separators split a folder into groups; each group is ordered on its own and
/// separators never move.
pub struct TreeSorter {
    store: Arc<TreeStore>,
    criteria: RwLock<SortCriteria>,
    scope: RwLock<SortScope>,
    paused: AtomicBool,
}

impl TreeSorter {
    pub fn new(store: Arc<TreeStore>) -> Self {
        Self {
            store,
            criteria: RwLock::new(SortCriteria::default()),
            scope: RwLock::new(SortScope::default()),
            paused: AtomicBool::new(false),
        }
    }

    pub fn criteria(&self) -> SortCriteria {
        *self.criteria.read()
    }

    pub fn scope(&self) -> SortScope {
        *self.scope.read()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(AtomicOrdering::SeqCst)
    }

    fn sort_children(
        tree: &mut BookmarkTree,
        folder: FolderId,
        criteria: &SortCriteria,
        scope: &SortScope,
    ) -> Result<()> {
        tree.reorder_children(folder, |tree, children| {
            for group in groups(tree, children) {
                children[group].sort_by(|a, b| match (tree.get(*a), tree.get(*b)) {
                    (Some(a), Some(b)) => compare_items(a, b, criteria, scope),
                    _ => Ordering::Equal,
                });
            }
        })?;
        Ok(())
    }
}

impl SortEngine for TreeSorter {
    fn sort_folder(&self, folder: FolderId) -> Result<()> {
        if self.is_paused() {
            debug!(%folder, "sorter paused, skipping folder sort");
            return Ok(());
        }
        let criteria = self.criteria();
        let scope = self.scope();

        let mut tree = self.store.write();
        if !tree.contains(folder.into()) {
            debug!(%folder, "folder vanished before its sort");
            return Ok(());
        }
        match tree.root_of(folder.into()) {
            Some(root) if scope.roots.contains(root) => {}
            _ => {
                debug!(%folder, "folder outside sorted roots");
                return Ok(());
            }
        }

        Self::sort_children(&mut tree, folder, &criteria, &scope)?;
        debug!(%folder, %criteria, "sorted folder");
        Ok(())
    }

    fn sort_all(&self) -> Result<()> {
        if self.is_paused() {
            debug!("sorter paused, skipping full sort");
            return Ok(());
        }
        let criteria = self.criteria();
        let scope = self.scope();

        let mut tree = self.store.write();
        let mut sorted = 0usize;
        for root in RootFolder::ALL {
            if !scope.roots.contains(root) {
                continue;
            }
            for folder in tree.folders_under(root.id()) {
                Self::sort_children(&mut tree, folder, &criteria, &scope)?;
                sorted += 1;
            }
        }
        debug!(folders = sorted, %criteria, "sorted all bookmarks");
        Ok(())
    }

    fn set_criteria(&self, criteria: SortCriteria) {
        *self.criteria.write() = criteria;
    }

    fn set_scope(&self, scope: SortScope) {
        *self.scope.write() = scope;
    }

    fn start(&self) {
        self.paused.store(false, AtomicOrdering::SeqCst);
    }

    fn stop(&self) {
        self.paused.store(true, AtomicOrdering::SeqCst);
    }
}

/// Index ranges of the runs of non-separator children
fn groups(tree: &BookmarkTree, children: &[ItemId]) -> SmallVec<[Range<usize>; 4]> {
    let mut ranges = SmallVec::new();
    let mut start = 0;
    for (index, id) in children.iter().enumerate() {
        let is_separator = tree
            .get(*id)
            .map(|item| item.kind == ItemKind::Separator)
            .unwrap_or(false);
        if is_separator {
            if index > start {
                ranges.push(start..index);
            }
            start = index + 1;
        }
    }
    if children.len() > start {
        ranges.push(start..children.len());
    }
    ranges
}

/// Total order of two siblings: kind rank, then primary key, then secondary key
pub fn compare_items(a: &Item, b: &Item, criteria: &SortCriteria, scope: &SortScope) -> Ordering {
    scope
        .rank(a.kind)
        .cmp(&scope.rank(b.kind))
        .then_with(|| directed(compare_key(a, b, criteria.primary), criteria.primary_inverse))
        .then_with(|| directed(compare_key(a, b, criteria.secondary), criteria.secondary_inverse))
}

fn directed(ordering: Ordering, inverse: bool) -> Ordering {
    if inverse {
        ordering.reverse()
    } else {
        ordering
    }
}

fn compare_key(a: &Item, b: &Item, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => compare_text(Some(&a.title), Some(&b.title)),
        SortKey::Url => compare_text(a.url.as_ref(), b.url.as_ref()),
        SortKey::Description => compare_text(a.description.as_ref(), b.description.as_ref()),
        SortKey::Keyword => compare_text(a.keyword.as_ref(), b.keyword.as_ref()),
        SortKey::DateAdded => a.date_added.cmp(&b.date_added),
        SortKey::LastModified => a.last_modified.cmp(&b.last_modified),
        SortKey::LastVisited => a.last_visited.cmp(&b.last_visited),
        SortKey::AccessCount => a.access_count.cmp(&b.access_count),
    }
}

/// Case-insensitive; missing text sorts as empty
fn compare_text(a: Option<&String>, b: Option<&String>) -> Ordering {
    let a = a.map(|s| s.to_lowercase()).unwrap_or_default();
    let b = b.map(|s| s.to_lowercase()).unwrap_or_default();
    a.cmp(&b)
}
