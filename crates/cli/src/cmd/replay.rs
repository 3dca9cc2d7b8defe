//! Replay of a mutation script with automatic sorting on
//!
//! Each line of the script is one JSON operation:
//!
//! ```text
//! {"op": "add", "parent": "menu", "title": "Rust", "url": "https://rust-lang.org", "as": "rust"}
//! {"op": "add", "parent": "menu", "kind": "folder", "title": "News", "as": "news"}
//! {"op": "move", "item": "rust", "parent": "news", "index": 0}
//! {"op": "change", "item": "rust", "title": "The Rust Language"}
//! {"op": "visit", "item": 12}
//! {"op": "remove", "item": "rust"}
//! {"op": "batch", "ops": [ ... ]}
//! {"op": "sleep", "ms": 500}
//! ```
//!
//! Items are referenced by numeric id or by the label given with `as`. The roots
//! are pre-labelled `menu`, `toolbar` and `unsorted`.

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use prefs::options::AUTO_SORT;
use serde::Deserialize;
use sort_core::{
    FolderId, ItemChange, ItemId, ItemKind, NewItem, RootFolder, SortCriteria, SortEngine,
    SortScope, TreeSorter, TreeStore,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Op {
    Add {
        parent: ItemRef,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        kind: Option<ItemKind>,
        #[serde(default)]
        title: String,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        keyword: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default, rename = "as")]
        label: Option<String>,
    },
    Move {
        item: ItemRef,
        parent: ItemRef,
        #[serde(default)]
        index: Option<usize>,
    },
    Remove {
        item: ItemRef,
    },
    Change {
        item: ItemRef,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        keyword: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    Visit {
        item: ItemRef,
    },
    Batch {
        ops: Vec<Op>,
    },
    Sleep {
        ms: u64,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ItemRef {
    Id(u64),
    Label(String),
}

/// Applies operations and remembers labels
struct Replayer {
    labels: HashMap<String, ItemId>,
}

impl Replayer {
    fn new() -> Self {
        let labels = [
            ("menu", RootFolder::Menu),
            ("toolbar", RootFolder::Toolbar),
            ("unsorted", RootFolder::Unsorted),
        ]
        .into_iter()
        .map(|(label, root)| (label.to_string(), ItemId::from(root.id())))
        .collect();
        Self { labels }
    }

    fn resolve(&self, item: &ItemRef) -> Result<ItemId> {
        match item {
            ItemRef::Id(id) => Ok(ItemId(*id)),
            ItemRef::Label(label) => self
                .labels
                .get(label)
                .copied()
                .with_context(|| format!("Unknown item label: {}", label)),
        }
    }

    fn resolve_folder(&self, item: &ItemRef) -> Result<FolderId> {
        self.resolve(item).map(|id| FolderId(id.0))
    }

    /// Apply one operation; sleeping is handled by the caller
    fn apply(&mut self, tree: &TreeStore, op: Op) -> Result<()> {
        match op {
            Op::Add {
                parent,
                index,
                kind,
                title,
                url,
                keyword,
                description,
                label,
            } => {
                let kind = kind.unwrap_or(if url.is_some() {
                    ItemKind::Bookmark
                } else {
                    ItemKind::Folder
                });
                let new = NewItem {
                    kind,
                    title,
                    url,
                    keyword,
                    description,
                };
                let id = tree.add(self.resolve_folder(&parent)?, index, new)?;
                if let Some(label) = label {
                    self.labels.insert(label, id);
                }
            }
            Op::Move {
                item,
                parent,
                index,
            } => tree.move_item(self.resolve(&item)?, self.resolve_folder(&parent)?, index)?,
            Op::Remove { item } => tree.remove(self.resolve(&item)?)?,
            Op::Change {
                item,
                title,
                url,
                keyword,
                description,
            } => {
                let change = ItemChange {
                    title,
                    url,
                    keyword,
                    description,
                };
                tree.change(self.resolve(&item)?, change)?;
            }
            Op::Visit { item } => tree.visit(self.resolve(&item)?)?,
            Op::Batch { ops } => {
                tree.run_in_batch(|tree| ops.into_iter().try_for_each(|op| self.apply(tree, op)))?
            }
            Op::Sleep { .. } => anyhow::bail!("sleep is not allowed inside a batch"),
        }
        Ok(())
    }
}

/// Sort engine that prints every invocation before delegating
struct ReportingEngine {
    inner: TreeSorter,
    tree: Arc<TreeStore>,
    started: Instant,
    folder_sorts: AtomicUsize,
    full_sorts: AtomicUsize,
}

impl ReportingEngine {
    fn new(tree: Arc<TreeStore>) -> Self {
        Self {
            inner: TreeSorter::new(Arc::clone(&tree)),
            tree,
            started: Instant::now(),
            folder_sorts: AtomicUsize::new(0),
            full_sorts: AtomicUsize::new(0),
        }
    }

    fn stamp(&self) -> String {
        format!("+{:.1}s", self.started.elapsed().as_secs_f64())
    }
}

impl SortEngine for ReportingEngine {
    fn sort_folder(&self, folder: FolderId) -> anyhow::Result<()> {
        let title = self
            .tree
            .read()
            .get(ItemId::from(folder))
            .map(|item| item.title.clone());
        self.folder_sorts.fetch_add(1, Ordering::SeqCst);
        match title {
            Some(title) => println!(
                "{} sort folder {:?} ({})",
                self.stamp().dimmed(),
                title,
                folder
            ),
            None => println!("{} sort folder {} (gone)", self.stamp().dimmed(), folder),
        }
        self.inner.sort_folder(folder)
    }

    fn sort_all(&self) -> anyhow::Result<()> {
        self.full_sorts.fetch_add(1, Ordering::SeqCst);
        println!("{} sort all", self.stamp().dimmed());
        self.inner.sort_all()
    }

    fn set_criteria(&self, criteria: SortCriteria) {
        self.inner.set_criteria(criteria);
    }

    fn set_scope(&self, scope: SortScope) {
        self.inner.set_scope(scope);
    }

    fn start(&self) {
        self.inner.start();
    }

    fn stop(&self) {
        self.inner.stop();
    }
}

fn read_ops(path: &Path) -> Result<Vec<Op>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read operations from {}", path.display()))?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<Op>(line)
                .with_context(|| format!("{}:{}: invalid operation", path.display(), number + 1))
        })
        .collect()
}

/// Replay `ops_path` against `tree_path` and rewrite the tree
pub async fn run(prefs_path: &Path, tree_path: &Path, ops_path: &Path) -> Result<()> {
    let ops = read_ops(ops_path)?;
    let prefs = util::open_prefs(prefs_path)?;
    let tree = util::open_tree(tree_path)?;
    let engine = Arc::new(ReportingEngine::new(Arc::clone(&tree)));

    // Migration is left to `abs migrate`; the preference file is never written here
    let startup = watcher::bootstrap(
        Arc::clone(&prefs),
        Arc::clone(&engine) as Arc<dyn SortEngine>,
        &tree,
        Handle::current(),
        true,
    )
    .context("Failed to start the auto sorter")?;
    prefs.set_option(AUTO_SORT, true)?;
    let sorter = startup.sorter;

    let mut replayer = Replayer::new();
    let count = ops.len();
    for op in ops {
        match op {
            Op::Sleep { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
            op => {
                debug!(?op, "replaying");
                replayer.apply(&tree, op)?;
            }
        }
    }

    sorter.scheduler().wait_idle().await;
    sorter.shutdown();
    util::save_tree(&tree, tree_path)?;

    let folder_sorts = engine.folder_sorts.load(Ordering::SeqCst);
    let full_sorts = engine.full_sorts.load(Ordering::SeqCst);
    info!(count, folder_sorts, full_sorts, "replay finished");
    println!(
        "{} Replayed {} operation(s): {} folder sort(s), {} full sort(s)",
        "✓".green(),
        count,
        folder_sorts,
        full_sorts
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operations() {
        let add: Op = serde_json::from_str(
            r#"{"op": "add", "parent": "menu", "title": "a", "url": "https://a", "as": "a"}"#,
        )
        .unwrap();
        assert!(matches!(
            add,
            Op::Add { parent: ItemRef::Label(ref p), label: Some(ref l), .. } if p == "menu" && l == "a"
        ));

        let remove: Op = serde_json::from_str(r#"{"op": "remove", "item": 7}"#).unwrap();
        assert!(matches!(remove, Op::Remove { item: ItemRef::Id(7) }));

        let batch: Op = serde_json::from_str(
            r#"{"op": "batch", "ops": [{"op": "visit", "item": "x"}, {"op": "remove", "item": 2}]}"#,
        )
        .unwrap();
        assert!(matches!(batch, Op::Batch { ref ops } if ops.len() == 2));

        assert!(serde_json::from_str::<Op>(r#"{"op": "explode"}"#).is_err());
    }

    #[test]
    fn test_labels_resolve_roots_and_added_items() {
        let tree = TreeStore::default();
        let mut replayer = Replayer::new();
        replayer
            .apply(
                &tree,
                Op::Add {
                    parent: ItemRef::Label("toolbar".into()),
                    index: None,
                    kind: None,
                    title: "News".into(),
                    url: None,
                    keyword: None,
                    description: None,
                    label: Some("news".into()),
                },
            )
            .unwrap();

        let news = replayer.resolve(&ItemRef::Label("news".into())).unwrap();
        let read = tree.read();
        assert_eq!(read.get(news).unwrap().kind, ItemKind::Folder);
        assert_eq!(read.folder_of(news).unwrap(), RootFolder::Toolbar.id());
        assert!(replayer.resolve(&ItemRef::Label("missing".into())).is_err());
    }

    #[test]
    fn test_sleep_rejected_inside_batch() {
        let tree = TreeStore::default();
        let mut replayer = Replayer::new();
        let batch = Op::Batch {
            ops: vec![Op::Sleep { ms: 1 }],
        };
        assert!(replayer.apply(&tree, batch).is_err());
    }
}
