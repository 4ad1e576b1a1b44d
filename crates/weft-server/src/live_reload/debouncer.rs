//! Event debouncing for live reload.
//!
//! Editors emit bursts of events per save (write temp, rename, chmod). Events
//! are held per path until the path has been quiet for the debounce window,
//! then emitted once with a coalesced kind.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Kind of filesystem event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FsEventKind {
    Created,
    Modified,
    Removed,
}

/// A debounced filesystem event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

struct PendingEvent {
    kind: FsEventKind,
    deadline: Instant,
}

/// Per-path event coalescer, shared between the watcher callback side and
/// the processing task.
pub(crate) struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, PendingEvent>>,
    window: Duration,
}

impl EventDebouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            window,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, PendingEvent>> {
        // The map holds no invariants a panicking holder could break
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an event, restarting the path's quiet window.
    pub(crate) fn record(&self, path: PathBuf, kind: FsEventKind) {
        let deadline = Instant::now() + self.window;
        let mut pending = self.lock();

        let merged = match pending.get(&path) {
            Some(existing) => coalesce(existing.kind, kind),
            None => Some(kind),
        };

        match merged {
            Some(kind) => {
                pending.insert(path, PendingEvent { kind, deadline });
            }
            None => {
                pending.remove(&path);
            }
        }
    }

    /// Remove and return every event whose quiet window has passed, sorted by path.
    pub(crate) fn drain_ready(&self) -> Vec<FsEvent> {
        let now = Instant::now();
        let mut ready: Vec<FsEvent> = self
            .lock()
            .extract_if(|_, event| event.deadline <= now)
            .map(|(path, event)| FsEvent {
                path,
                kind: event.kind,
            })
            .collect();
        ready.sort_by(|a, b| a.path.cmp(&b.path));
        ready
    }
}

/// Merge a new event into a pending one.
///
/// `None` means the path appeared and vanished within one window, so nothing
/// is emitted for it.
#[allow(clippy::match_same_arms)]
fn coalesce(existing: FsEventKind, new: FsEventKind) -> Option<FsEventKind> {
    use FsEventKind::{Created, Modified, Removed};

    match (existing, new) {
        (Created, Created | Modified) => Some(Created),
        (Created, Removed) => None,
        (Modified, Created) => Some(Created),
        (Modified, Modified) => Some(Modified),
        (Modified, Removed) => Some(Removed),
        // Atomic save: delete then recreate
        (Removed, Created) => Some(Modified),
        (Removed, Modified | Removed) => Some(Removed),
    }
}
