//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Keep one native `notify` subscription per watched file
//! - Collapse a burst of change events into a single callback
//! - Drop late events once watching stops
//!
//! # Design Decisions
//! - Each file is watched through its parent directory, filtered by file name,
//!   so editors that replace the file and files that do not exist yet still work
//! - Only last-write changes count; create, delete and rename are ignored
//! - The latch is edge-triggered: the first event fires the callback, later
//!   events are ignored until `reset`
//! - The callback runs outside the lock, so it may call back into the debouncer

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use notify::event::{MetadataKind, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Observable state of the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No subscriptions.
    Idle,
    /// Watching, waiting for the first change.
    Armed,
    /// Callback fired; further events are ignored until `reset`.
    Triggered,
}

#[derive(Default)]
struct WatchSet {
    watchers: HashMap<PathBuf, RecommendedWatcher>,
    notified: bool,
}

struct Shared {
    watch_set: Mutex<WatchSet>,
    on_change: Box<dyn Fn() + Send + Sync>,
}

/// Watches a set of files and fires `on_change` once per burst of changes.
#[derive(Clone)]
pub struct ChangeDebouncer {
    shared: Arc<Shared>,
}

impl ChangeDebouncer {
    pub fn new<F>(on_change: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                watch_set: Mutex::new(WatchSet::default()),
                on_change: Box::new(on_change),
            }),
        }
    }

    /// Subscribe to every path not already watched. Paths whose directory
    /// cannot be watched are skipped with a warning. Returns how many paths
    /// are watched afterwards.
    pub fn watch<P: AsRef<Path>>(&self, paths: &[P]) -> usize {
        let mut created = Vec::new();
        for path in paths {
            let path = path.as_ref().to_path_buf();
            if self.lock().watchers.contains_key(&path) || created.iter().any(|(p, _)| *p == path) {
                continue;
            }
            match self.subscribe(&path) {
                Ok(watcher) => created.push((path, watcher)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot watch configuration file");
                }
            }
        }

        let mut set = self.lock();
        for (path, watcher) in created {
            tracing::debug!(path = %path.display(), "Watching configuration file");
            set.watchers.insert(path, watcher);
        }
        set.watchers.len()
    }

    fn subscribe(&self, path: &Path) -> notify::Result<RecommendedWatcher> {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !directory.is_dir() {
            return Err(notify::Error::path_not_found().add_path(directory));
        }

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let watched = path.to_path_buf();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Some(shared) = shared.upgrade() {
                    shared.handle_event(&watched, res);
                }
            },
            Config::default(),
        )?;
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }

    /// Re-arm the latch so the next change fires the callback again.
    pub fn reset(&self) {
        self.lock().notified = false;
    }

    /// Drop every subscription. Idempotent; events arriving afterwards are
    /// ignored.
    pub fn stop_watching(&self) {
        let watchers = {
            let mut set = self.lock();
            set.notified = false;
            std::mem::take(&mut set.watchers)
        };
        if !watchers.is_empty() {
            tracing::debug!(count = watchers.len(), "Stopped watching configuration files");
        }
        drop(watchers);
    }

    pub fn state(&self) -> DebounceState {
        let set = self.lock();
        if set.watchers.is_empty() {
            DebounceState::Idle
        } else if set.notified {
            DebounceState::Triggered
        } else {
            DebounceState::Armed
        }
    }

    pub fn is_watching(&self) -> bool {
        !self.lock().watchers.is_empty()
    }

    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.lock().watchers.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> MutexGuard<'_, WatchSet> {
        self.shared.lock()
    }

    #[cfg(test)]
    fn handle_event(&self, watched: &Path, res: notify::Result<Event>) {
        self.shared.handle_event(watched, res)
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WatchSet> {
        self.watch_set.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_event(&self, watched: &Path, res: notify::Result<Event>) {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(path = %watched.display(), error = %e, "File watch error");
                return;
            }
        };

        if !is_last_write(&event.kind) {
            return;
        }
        if !event
            .paths
            .iter()
            .any(|path| path.file_name() == watched.file_name())
        {
            return;
        }

        {
            let mut set = self.lock();
            if !set.watchers.contains_key(watched) || set.notified {
                return;
            }
            set.notified = true;
        }

        tracing::info!(path = %watched.display(), "Configuration file change detected");
        if panic::catch_unwind(AssertUnwindSafe(|| (self.on_change)())).is_err() {
            tracing::error!(path = %watched.display(), "Configuration change callback panicked");
        }
    }
}

fn is_last_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime | MetadataKind::Any))
    )
}

impl fmt::Debug for ChangeDebouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDebouncer")
            .field("state", &self.state())
            .field("paths", &self.watched_paths())
            .finish()
    }
}
