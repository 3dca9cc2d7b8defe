//! Startup sequence

use crate::autosort::AutoSorter;
use crate::Result;
use prefs::lifecycle::{adjust_first_run, migrate_options, MigrationReport};
use prefs::options::{declare_options, set_preference_minimum_maximum};
use prefs::{PrefStore, PreferenceObserver};
use sort_core::{SortEngine, TreeObserver, TreeStore};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// A running auto sorter and what happened while starting it
pub struct Startup {
    pub sorter: Arc<AutoSorter>,
    pub migration: MigrationReport,
    pub first_run: bool,
}

/// Bring up an `AutoSorter` over `tree`
///
/// Order: first-run marker, legacy migration, scope and criteria, auto-sort
/// state, preference subscription, option bounds, first-run marker again.
/// Criteria and scope errors are logged and leave the engine defaults in place.
pub fn bootstrap(
    prefs: Arc<PrefStore>,
    engine: Arc<dyn SortEngine>,
    tree: &TreeStore,
    runtime: Handle,
    install: bool,
) -> Result<Startup> {
    declare_options(&prefs);
    let first_run = adjust_first_run(&prefs)?;
    let migration = migrate_options(&prefs, install);

    let sorter = Arc::new(AutoSorter::new(Arc::clone(&prefs), engine, runtime));
    tree.observe(Arc::downgrade(&sorter) as Weak<dyn TreeObserver>);

    if let Err(e) = sorter.adjust_sort_scope() {
        warn!("Keeping default sort scope: {}", e);
    }
    if let Err(e) = sorter.adjust_sort_criteria() {
        warn!("Keeping default sort criteria: {}", e);
    }
    sorter.adjust_auto_sort()?;

    prefs.observe(Arc::downgrade(&sorter) as Weak<dyn PreferenceObserver>);
    set_preference_minimum_maximum(&prefs)?;
    adjust_first_run(&prefs)?;

    info!(
        first_run,
        migrated = migration.ran,
        auto_sort = sorter.is_observing(),
        "Auto sorter started"
    );
    Ok(Startup {
        sorter,
        migration,
        first_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefs::lifecycle::LEGACY_AUTO_SORT;
    use prefs::options::{option_name, AUTO_SORT, FIRST_RUN, FOLDER_DELAY};
    use sort_core::{RootFolder, TreeSorter};

    fn engine(tree: &Arc<TreeStore>) -> Arc<dyn SortEngine> {
        Arc::new(TreeSorter::new(Arc::clone(tree)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_install_leaves_auto_sort_off() {
        let prefs = Arc::new(PrefStore::new());
        let tree = Arc::new(TreeStore::default());

        let startup = bootstrap(prefs.clone(), engine(&tree), &tree, Handle::current(), true)
            .unwrap();
        assert!(startup.first_run);
        assert!(!startup.migration.ran);
        assert!(!startup.sorter.is_observing());
        assert!(!prefs.option_bool(FIRST_RUN).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_upgrade_migrates_and_enables() {
        let prefs = Arc::new(PrefStore::new());
        prefs.set(LEGACY_AUTO_SORT, true).unwrap();
        let tree = Arc::new(TreeStore::default());

        let startup = bootstrap(prefs.clone(), engine(&tree), &tree, Handle::current(), false)
            .unwrap();
        assert!(startup.migration.ran && startup.migration.is_clean());
        assert!(prefs.option_bool(AUTO_SORT).unwrap());
        assert!(startup.sorter.is_observing());
        assert!(startup.sorter.scheduler().is_full_sort_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_clamps_stored_values() {
        let prefs = Arc::new(PrefStore::new());
        prefs.set(&option_name(FIRST_RUN), false).unwrap();
        prefs.set(&option_name(FOLDER_DELAY), 1).unwrap();
        let tree = Arc::new(TreeStore::default());

        let startup = bootstrap(prefs.clone(), engine(&tree), &tree, Handle::current(), false)
            .unwrap();
        assert!(!startup.first_run);
        assert!(!startup.migration.ran);
        assert_eq!(prefs.option_int(FOLDER_DELAY).unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tree_changes_reach_sorter_after_startup() {
        let prefs = Arc::new(PrefStore::new());
        prefs.set(&option_name(FIRST_RUN), false).unwrap();
        prefs.set(&option_name(AUTO_SORT), true).unwrap();
        let tree = Arc::new(TreeStore::default());
        let startup = bootstrap(prefs.clone(), engine(&tree), &tree, Handle::current(), false)
            .unwrap();
        startup.sorter.scheduler().wait_idle().await;

        tree.add(
            RootFolder::Toolbar.id(),
            None,
            sort_core::NewItem::bookmark("b", "https://b"),
        )
        .unwrap();
        assert!(startup
            .sorter
            .scheduler()
            .is_pending(RootFolder::Toolbar.id()));
    }
}
