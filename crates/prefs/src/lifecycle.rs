//! First-run handling and legacy option migration

use crate::error::MigrationError;
use crate::migrate::{PreferenceMigrator, StructuredMapping};
use crate::options::{
    option_name, AUTO_SORT, BOOKMARK_SORT_ORDER, FIRST_RUN, FOLDER_SORT_ORDER,
    LIVEMARK_SORT_ORDER, SMART_BOOKMARK_SORT_ORDER, SORT_TOOLBAR,
};
use crate::store::PrefStore;
use crate::Result;
use tracing::{info, warn};

pub const LEGACY_AUTO_SORT: &str = "extensions.sortbookmarks.autosort";
pub const LEGACY_SORT_BAR: &str = "extensions.sortbookmarks.sortbar";
pub const LEGACY_ORDER: &str = "extensions.sortbookmarks.order";

/// Why the sorter is being unloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadReason {
    Disable,
    Shutdown,
    Uninstall,
    Upgrade,
}

/// Outcome of `migrate_options`
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Whether the legacy migrations were attempted at all
    pub ran: bool,
    /// Steps that failed and were left unapplied
    pub failures: Vec<MigrationError>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Mark the first run
///
/// An existing marker is cleared. A missing marker is created as `true` and
/// automatic sorting is switched off. Returns whether this is a first run.
pub fn adjust_first_run(store: &PrefStore) -> Result<bool> {
    let marker = option_name(FIRST_RUN);
    if store.has(&marker) {
        store.set(&marker, false)?;
        Ok(false)
    } else {
        store.set(&marker, true)?;
        store.set_option(AUTO_SORT, false)?;
        info!("first run");
        Ok(true)
    }
}

/// Field mapping of the legacy kind-order preference
pub fn legacy_order_mapping() -> StructuredMapping {
    StructuredMapping::named([
        ("folders", FOLDER_SORT_ORDER, 1),
        ("liveBookmarks", LIVEMARK_SORT_ORDER, 2),
        ("smartBookmarks", SMART_BOOKMARK_SORT_ORDER, 3),
        ("bookmarks", BOOKMARK_SORT_ORDER, 4),
    ])
}

/// Copy legacy options on the first run after an upgrade
///
/// Skipped for fresh installs and when the first-run marker is not set. Each step
/// runs independently; a failed step is logged and reported, the rest still run.
pub fn migrate_options(store: &PrefStore, install: bool) -> MigrationReport {
    let first_run = store.option_bool(FIRST_RUN).unwrap_or(false);
    if install || !first_run {
        return MigrationReport::default();
    }

    let migrator = PreferenceMigrator::new(store);
    let steps: [(&str, std::result::Result<(), MigrationError>); 3] = [
        (
            LEGACY_AUTO_SORT,
            migrator
                .migrate_scalar(LEGACY_AUTO_SORT, AUTO_SORT, true)
                .map(drop),
        ),
        (
            LEGACY_SORT_BAR,
            migrator
                .migrate_scalar(LEGACY_SORT_BAR, SORT_TOOLBAR, true)
                .map(drop),
        ),
        (
            LEGACY_ORDER,
            migrator
                .migrate_structured(LEGACY_ORDER, &legacy_order_mapping())
                .map(drop),
        ),
    ];

    let mut report = MigrationReport {
        ran: true,
        failures: Vec::new(),
    };
    for (legacy, outcome) in steps {
        if let Err(e) = outcome {
            warn!(legacy, error = %e, "legacy migration step failed");
            report.failures.push(e);
        }
    }
    report
}

/// Forget the first-run marker when the sorter is disabled
pub fn on_unload(store: &PrefStore, reason: UnloadReason) {
    if reason == UnloadReason::Disable {
        store.reset(&option_name(FIRST_RUN));
    }
}
