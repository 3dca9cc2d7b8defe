//! Change reaction for Autosort
//!
//! This crate turns tree notifications into sort work:
//! - Routing of each notification to a folder and settle delay
//! - Per-folder debouncing on a tokio runtime
//! - Batch suspension with a full sort on batch end
//! - The `AutoSorter` facade wiring preferences, tree and engine together

pub mod autosort;
pub mod batch;
pub mod debounce;
pub mod router;
pub mod startup;

pub use autosort::AutoSorter;
pub use batch::{BatchController, BatchState};
pub use debounce::{DebounceScheduler, SortTarget, Trigger, MAX_DELAY};
pub use router::{route, Delays, Route};
pub use startup::{bootstrap, Startup};

use prefs::PrefError;
use sort_core::ConfigurationError;
use thiserror::Error;

/// Errors surfaced by the facade
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("no tokio runtime is available to run sort timers")]
    NoRuntime,

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Preferences(#[from] PrefError),
}

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
