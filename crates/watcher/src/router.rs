//! Classification of tree notifications into scheduling actions

use sort_core::{FolderId, ItemKind, TreeEvent};
use std::time::Duration;

/// The two settle delays a trigger can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    /// After an ordinary item change
    pub item: Duration,
    /// After a folder is added or moved
    pub folder: Duration,
}

impl Delays {
    /// Delay for an add or move of an item of `kind`
    pub fn for_kind(&self, kind: ItemKind) -> Duration {
        if kind == ItemKind::Folder {
            self.folder
        } else {
            self.item
        }
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            item: Duration::from_secs(3),
            folder: Duration::from_secs(30),
        }
    }
}

/// What to do with one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Debounce a sort of `folder` after `delay`
    Debounce { folder: FolderId, delay: Duration },
    BeginBatch,
    EndBatch,
    Ignore,
}

/// Map a notification to its action
///
/// | event      | condition                    | action                          |
/// |------------|------------------------------|---------------------------------|
/// | add, move  | always                       | parent folder, kind delay       |
/// | change     | not deleted, not new folder  | parent folder, item delay       |
/// | remove     | separator                    | parent folder, item delay       |
/// | remove     | anything else                | ignore                          |
/// | visit      | always                       | parent folder, item delay       |
/// | batch      |                              | forwarded                       |
pub fn route(event: &TreeEvent, delays: &Delays) -> Route {
    match *event {
        TreeEvent::BeginBatch => Route::BeginBatch,
        TreeEvent::EndBatch => Route::EndBatch,
        TreeEvent::Added(item) | TreeEvent::Moved(item) => Route::Debounce {
            folder: item.folder(),
            delay: delays.for_kind(item.kind),
        },
        TreeEvent::Changed {
            item,
            deleted,
            new_folder,
        } => {
            if deleted || new_folder {
                Route::Ignore
            } else {
                Route::Debounce {
                    folder: item.folder(),
                    delay: delays.item,
                }
            }
        }
        TreeEvent::Removed(item) if item.kind == ItemKind::Separator => Route::Debounce {
            folder: item.folder(),
            delay: delays.item,
        },
        TreeEvent::Removed(_) => Route::Ignore,
        TreeEvent::Visited(item) => Route::Debounce {
            folder: item.folder(),
            delay: delays.item,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sort_core::{ItemId, ItemRef};

    const PARENT: FolderId = FolderId(10);

    fn item(kind: ItemKind) -> ItemRef {
        ItemRef::new(ItemId(42), kind, PARENT)
    }

    fn delays() -> Delays {
        Delays {
            item: Duration::from_secs(1),
            folder: Duration::from_secs(9),
        }
    }

    fn debounce(delay: u64) -> Route {
        Route::Debounce {
            folder: PARENT,
            delay: Duration::from_secs(delay),
        }
    }

    #[test]
    fn test_add_and_move_use_kind_delay() {
        let delays = delays();
        for event in [TreeEvent::Added, TreeEvent::Moved] {
            assert_eq!(route(&event(item(ItemKind::Folder)), &delays), debounce(9));
            assert_eq!(route(&event(item(ItemKind::Bookmark)), &delays), debounce(1));
            assert_eq!(route(&event(item(ItemKind::Livemark)), &delays), debounce(1));
        }
    }

    #[test]
    fn test_change_skips_deleted_and_new_folders() {
        let delays = delays();
        let change = |deleted, new_folder| TreeEvent::Changed {
            item: item(ItemKind::Folder),
            deleted,
            new_folder,
        };

        assert_eq!(route(&change(false, false), &delays), debounce(1));
        assert_eq!(route(&change(true, false), &delays), Route::Ignore);
        assert_eq!(route(&change(false, true), &delays), Route::Ignore);
    }

    #[test]
    fn test_remove_only_routes_separators() {
        let delays = delays();
        assert_eq!(
            route(&TreeEvent::Removed(item(ItemKind::Separator)), &delays),
            debounce(1)
        );
        for kind in [
            ItemKind::Bookmark,
            ItemKind::Folder,
            ItemKind::Livemark,
            ItemKind::SmartGroup,
        ] {
            assert_eq!(route(&TreeEvent::Removed(item(kind)), &delays), Route::Ignore);
        }
    }

    #[test]
    fn test_visit_and_batch_markers() {
        let delays = delays();
        assert_eq!(
            route(&TreeEvent::Visited(item(ItemKind::Folder)), &delays),
            debounce(1)
        );
        assert_eq!(route(&TreeEvent::BeginBatch, &delays), Route::BeginBatch);
        assert_eq!(route(&TreeEvent::EndBatch, &delays), Route::EndBatch);
    }
}
