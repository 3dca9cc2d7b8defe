//! Facade tying preferences, tree notifications and the sort engine together

use crate::batch::BatchController;
use crate::debounce::{DebounceScheduler, Trigger};
use crate::router::{route, Delays, Route};
use crate::{Result, WatchError};
use prefs::options::{
    short_name, AUTO_SORT, CRITERIA_OPTIONS, DELAY, FOLDER_DELAY, INVERSE, ROOT_OPTIONS,
    SORT_BY, SORT_ORDER_OPTIONS, THEN_INVERSE, THEN_SORT_BY,
};
use prefs::{PrefStore, PreferenceObserver};
use sort_core::{
    CriteriaConfigurator, FolderId, SortCriteria, SortEngine, SortScope, TreeEvent, TreeObserver,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

/// Reacts to tree and preference changes by scheduling sorts
///
/// Register it with both the `TreeStore` and the `PrefStore`; it ignores tree
/// notifications entirely while automatic sorting is off.
pub struct AutoSorter {
    prefs: Arc<PrefStore>,
    scheduler: DebounceScheduler,
    batch: BatchController,
    configurator: CriteriaConfigurator,
    observing: AtomicBool,
}

impl AutoSorter {
    pub fn new(prefs: Arc<PrefStore>, engine: Arc<dyn SortEngine>, runtime: Handle) -> Self {
        Self {
            prefs,
            scheduler: DebounceScheduler::new(engine, runtime),
            batch: BatchController::new(),
            configurator: CriteriaConfigurator::default(),
            observing: AtomicBool::new(false),
        }
    }

    /// Construct on the current tokio runtime
    pub fn on_current_runtime(prefs: Arc<PrefStore>, engine: Arc<dyn SortEngine>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| WatchError::NoRuntime)?;
        Ok(Self::new(prefs, engine, runtime))
    }

    pub fn scheduler(&self) -> &DebounceScheduler {
        &self.scheduler
    }

    pub fn batch(&self) -> &BatchController {
        &self.batch
    }

    pub fn prefs(&self) -> &Arc<PrefStore> {
        &self.prefs
    }

    pub fn is_observing(&self) -> bool {
        self.observing.load(Ordering::SeqCst)
    }

    /// Settle delays from the `delay` and `folder_delay` options
    pub fn delays(&self) -> Delays {
        let read = |name: &str, fallback: Duration| {
            self.prefs.option_seconds(name).unwrap_or_else(|e| {
                warn!("Unreadable delay option {}: {}", name, e);
                fallback
            })
        };
        let defaults = Delays::default();
        Delays {
            item: read(DELAY, defaults.item),
            folder: read(FOLDER_DELAY, defaults.folder),
        }
    }

    /// Follow the `auto_sort` option
    ///
    /// Observation stops first. When the option is on it resumes and the whole tree
    /// is sorted.
    pub fn adjust_auto_sort(&self) -> Result<()> {
        if self.observing.swap(false, Ordering::SeqCst) {
            self.batch.reset(&self.scheduler);
        }
        if self.prefs.option_bool(AUTO_SORT)? {
            self.observing.store(true, Ordering::SeqCst);
            info!("Automatic sorting enabled");
            self.sort_all_bookmarks();
        } else {
            debug!("automatic sorting disabled");
        }
        Ok(())
    }

    /// Rebuild the sort criteria from the four criteria options
    ///
    /// On a configuration error the engine keeps its previous criteria.
    pub fn adjust_sort_criteria(&self) -> Result<SortCriteria> {
        let criteria = self.configurator.build(
            self.prefs.option_int(SORT_BY)?,
            self.prefs.option_bool(INVERSE)?,
            self.prefs.option_int(THEN_SORT_BY)?,
            self.prefs.option_bool(THEN_INVERSE)?,
        )?;
        self.scheduler.engine().set_criteria(criteria);
        debug!(%criteria, "sort criteria updated");
        self.sort_if_auto()?;
        Ok(criteria)
    }

    /// Rebuild the sorted roots and kind ranks
    pub fn adjust_sort_scope(&self) -> Result<SortScope> {
        let scope = self.prefs.sort_scope()?;
        self.scheduler.engine().set_scope(scope);
        debug!(?scope, "sort scope updated");
        self.sort_if_auto()?;
        Ok(scope)
    }

    /// Sort the whole tree as soon as possible, off the caller's stack
    pub fn sort_all_bookmarks(&self) -> Trigger {
        self.scheduler.schedule_all(Duration::ZERO)
    }

    /// `sort_all_bookmarks` when automatic sorting is on
    pub fn sort_if_auto(&self) -> Result<Option<Trigger>> {
        if self.prefs.option_bool(AUTO_SORT)? {
            Ok(Some(self.sort_all_bookmarks()))
        } else {
            Ok(None)
        }
    }

    /// Debounce a sort of `folder`
    pub fn sort_folder(&self, folder: FolderId, delay: Duration) -> Trigger {
        self.scheduler.schedule(folder, delay)
    }

    /// Stop reacting and cancel every pending sort
    pub fn shutdown(&self) {
        self.observing.store(false, Ordering::SeqCst);
        self.batch.reset(&self.scheduler);
        let cancelled = self.scheduler.cancel_all();
        info!("Auto sorter shut down ({} pending sorts cancelled)", cancelled);
    }

    fn dispatch_preference(&self, option: &str) -> Result<()> {
        if option == AUTO_SORT {
            self.adjust_auto_sort()
        } else if CRITERIA_OPTIONS.contains(&option) {
            self.adjust_sort_criteria().map(drop)
        } else if ROOT_OPTIONS.contains(&option) || SORT_ORDER_OPTIONS.contains(&option) {
            self.adjust_sort_scope().map(drop)
        } else {
            Ok(())
        }
    }
}

impl TreeObserver for AutoSorter {
    fn on_tree_event(&self, event: &TreeEvent) {
        if !self.is_observing() {
            return;
        }
        match route(event, &self.delays()) {
            Route::Debounce { folder, delay } => {
                self.scheduler.schedule(folder, delay);
            }
            Route::BeginBatch => self.batch.begin(&self.scheduler),
            Route::EndBatch => {
                self.batch.end(&self.scheduler);
            }
            Route::Ignore => trace!(?event, "ignored tree event"),
        }
    }
}

impl PreferenceObserver for AutoSorter {
    fn preference_changed(&self, name: &str) {
        let Some(option) = short_name(name) else {
            return;
        };
        if let Err(e) = self.dispatch_preference(option) {
            warn!("Failed to apply option {}: {}", option, e);
        }
    }
}
