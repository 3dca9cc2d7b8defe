//! Per-folder debouncing of sort work
//!
//! Each folder has at most one pending sort. A new trigger for the same folder
//! replaces the pending one, so a burst of changes costs a single sort that runs
//! `delay` after the last trigger. Sorts always run on a runtime task, never on
//! the caller's stack.

use parking_lot::Mutex;
use sort_core::{FolderId, SortEngine};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Longest wait a trigger can request; larger delays are capped here
pub const MAX_DELAY: Duration = Duration::from_secs(86400 * 365 * 30);

/// Deadline `delay` from now, capped at `MAX_DELAY`
fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay.min(MAX_DELAY))
        .unwrap_or_else(|| now + Duration::from_secs(86400))
}

/// What a pending sort will sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortTarget {
    Folder(FolderId),
    All,
}

/// Outcome of a schedule request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// No sort was pending for the target
    Scheduled,
    /// A pending sort was replaced and its timer reset
    Replaced,
    /// The scheduler is suspended; nothing was scheduled
    Suppressed,
}

struct PendingSort {
    deadline: Instant,
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Pending {
    folders: HashMap<FolderId, PendingSort>,
    all: Option<PendingSort>,
    next_generation: u64,
}

impl Pending {
    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.all.is_none()
    }

    /// Remove the entry for `target` if it still belongs to `generation`
    fn take_current(&mut self, target: SortTarget, generation: u64) -> bool {
        match target {
            SortTarget::Folder(folder) => {
                let current = self
                    .folders
                    .get(&folder)
                    .map_or(false, |pending| pending.generation == generation);
                if current {
                    self.folders.remove(&folder);
                }
                current
            }
            SortTarget::All => {
                let current = self
                    .all
                    .as_ref()
                    .map_or(false, |pending| pending.generation == generation);
                if current {
                    self.all = None;
                }
                current
            }
        }
    }
}

struct Inner {
    engine: Arc<dyn SortEngine>,
    pending: Mutex<Pending>,
    accepting: AtomicBool,
    /// Sorts that left the table and are running
    running: AtomicUsize,
    idle: Notify,
}

impl Inner {
    /// `running` is raised under the `pending` lock, so both are read under it
    fn is_idle(&self) -> bool {
        let pending = self.pending.lock();
        pending.is_empty() && self.running.load(Ordering::SeqCst) == 0
    }

    fn notify_if_idle(&self) {
        if self.is_idle() {
            self.idle.notify_waiters();
        }
    }

    async fn fire(self: Arc<Self>, target: SortTarget, deadline: Instant, generation: u64) {
        tokio::time::sleep_until(deadline).await;

        {
            let mut pending = self.pending.lock();
            if !pending.take_current(target, generation) {
                trace!(?target, generation, "stale timer");
                return;
            }
            self.running.fetch_add(1, Ordering::SeqCst);
        }

        let result = match target {
            SortTarget::Folder(folder) => self.engine.sort_folder(folder),
            SortTarget::All => self.engine.sort_all(),
        };
        if let Err(e) = result {
            warn!(?target, "Sort failed: {:#}", e);
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.notify_if_idle();
    }
}

/// Debounced, cancellable sort scheduling on a tokio runtime
pub struct DebounceScheduler {
    inner: Arc<Inner>,
    runtime: Handle,
}

impl DebounceScheduler {
    /// Create a scheduler whose timers run on `runtime`
    pub fn new(engine: Arc<dyn SortEngine>, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                pending: Mutex::new(Pending::default()),
                accepting: AtomicBool::new(true),
                running: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
            runtime,
        }
    }

    pub fn engine(&self) -> &Arc<dyn SortEngine> {
        &self.inner.engine
    }

    /// Sort `folder` once `delay` has passed without another trigger for it
    pub fn schedule(&self, folder: FolderId, delay: Duration) -> Trigger {
        if !self.is_accepting() {
            trace!(%folder, "scheduler suspended, dropping trigger");
            return Trigger::Suppressed;
        }

        let target = SortTarget::Folder(folder);
        let deadline = deadline_after(delay);
        let mut pending = self.inner.pending.lock();
        let entry = self.spawn(&mut pending, target, deadline);

        match pending.folders.insert(folder, entry) {
            Some(previous) => {
                previous.handle.abort();
                trace!(%folder, ?delay, "rescheduled folder sort");
                Trigger::Replaced
            }
            None => {
                trace!(%folder, ?delay, "scheduled folder sort");
                Trigger::Scheduled
            }
        }
    }

    /// Sort the whole tree after `delay`, superseding every pending folder sort
    pub fn schedule_all(&self, delay: Duration) -> Trigger {
        if !self.is_accepting() {
            trace!("scheduler suspended, dropping full sort");
            return Trigger::Suppressed;
        }

        let deadline = deadline_after(delay);
        let mut pending = self.inner.pending.lock();
        let superseded = pending.folders.len();
        for (_, entry) in pending.folders.drain() {
            entry.handle.abort();
        }
        let entry = self.spawn(&mut pending, SortTarget::All, deadline);

        let trigger = match pending.all.replace(entry) {
            Some(previous) => {
                previous.handle.abort();
                Trigger::Replaced
            }
            None => Trigger::Scheduled,
        };
        debug!(superseded, ?delay, "scheduled full sort");
        trigger
    }

    fn spawn(&self, pending: &mut Pending, target: SortTarget, deadline: Instant) -> PendingSort {
        let generation = pending.next_generation();
        let handle = self
            .runtime
            .spawn(Arc::clone(&self.inner).fire(target, deadline, generation));
        PendingSort {
            deadline,
            generation,
            handle,
        }
    }

    /// Cancel the pending sort of `folder`; absent entries are a no-op
    pub fn cancel(&self, folder: FolderId) -> bool {
        let removed = self.inner.pending.lock().folders.remove(&folder);
        let cancelled = removed.is_some();
        if let Some(entry) = removed {
            entry.handle.abort();
        }
        self.inner.notify_if_idle();
        cancelled
    }

    /// Cancel every pending sort, full sort included
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        {
            let mut pending = self.inner.pending.lock();
            for (_, entry) in pending.folders.drain() {
                entry.handle.abort();
                cancelled += 1;
            }
            if let Some(entry) = pending.all.take() {
                entry.handle.abort();
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            debug!("Cancelled {} pending sorts", cancelled);
        }
        self.inner.notify_if_idle();
        cancelled
    }

    /// Drop new triggers until `resume`
    pub fn suspend(&self) {
        self.inner.accepting.store(false, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.inner.accepting.store(true, Ordering::SeqCst);
    }

    pub fn is_accepting(&self) -> bool {
        self.inner.accepting.load(Ordering::SeqCst)
    }

    pub fn is_pending(&self, folder: FolderId) -> bool {
        self.inner.pending.lock().folders.contains_key(&folder)
    }

    pub fn is_full_sort_pending(&self) -> bool {
        self.inner.pending.lock().all.is_some()
    }

    /// Deadline of the pending sort of `folder`
    pub fn deadline(&self, folder: FolderId) -> Option<Instant> {
        self.inner
            .pending
            .lock()
            .folders
            .get(&folder)
            .map(|entry| entry.deadline)
    }

    /// Number of pending folder sorts
    pub fn pending_folders(&self) -> usize {
        self.inner.pending.lock().folders.len()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    /// Wait until nothing is pending or running
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.inner.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
