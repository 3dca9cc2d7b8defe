//! Suspension of sorting during bulk tree mutations

use crate::debounce::{DebounceScheduler, Trigger};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    InBatch,
}

/// Tracks whether the tree is inside a bulk mutation
///
/// Entering a batch cancels pending sorts, suspends the scheduler and stops the
/// engine. Leaving it restarts both and schedules one full sort, since the
/// triggers dropped during the batch are not tracked.
pub struct BatchController {
    state: Mutex<BatchState>,
}

impl Default for BatchController {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BatchState::Idle),
        }
    }

    pub fn state(&self) -> BatchState {
        *self.state.lock()
    }

    pub fn is_batching(&self) -> bool {
        self.state() == BatchState::InBatch
    }

    /// Handle a begin-batch notification
    pub fn begin(&self, scheduler: &DebounceScheduler) {
        let previous = std::mem::replace(&mut *self.state.lock(), BatchState::InBatch);
        if previous == BatchState::InBatch {
            trace!("already in batch");
            return;
        }

        let cancelled = scheduler.cancel_all();
        scheduler.suspend();
        scheduler.engine().stop();
        debug!(cancelled, "batch started, sorting suspended");
    }

    /// Handle an end-batch notification
    ///
    /// Always schedules a full sort, even without a matching begin.
    pub fn end(&self, scheduler: &DebounceScheduler) -> Trigger {
        *self.state.lock() = BatchState::Idle;
        scheduler.resume();
        scheduler.engine().start();
        debug!("batch ended, sorting everything");
        scheduler.schedule_all(Duration::ZERO)
    }

    /// Leave a batch without sorting
    pub fn reset(&self, scheduler: &DebounceScheduler) {
        let previous = std::mem::replace(&mut *self.state.lock(), BatchState::Idle);
        if previous == BatchState::InBatch {
            scheduler.resume();
            scheduler.engine().start();
            debug!("batch abandoned");
        }
    }
}
