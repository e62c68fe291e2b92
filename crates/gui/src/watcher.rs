//! Polling watcher flagging modified model files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::{Config, PollWatcher, RecursiveMode, Watcher};

/// How often watched files are checked for a new modification time
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("file watcher failed: {0}")]
    Notify(#[from] notify::Error),
}

pub struct FileWatcher {
    rx: Receiver<notify::Result<notify::Event>>,
    watcher: PollWatcher,
    watched: Vec<PathBuf>,
}

impl FileWatcher {
    /// Create a watcher. `wake` runs on the watcher thread after every event
    /// so that a sleeping UI can come back and call [`Self::changed_files`].
    pub fn new(interval: Duration, wake: impl Fn() + Send + 'static) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();
        let handler = move |event: notify::Result<notify::Event>| {
            if tx.send(event).is_ok() {
                wake();
            }
        };
        let watcher = PollWatcher::new(handler, Config::default().with_poll_interval(interval))?;
        Ok(Self {
            rx,
            watcher,
            watched: Vec::new(),
        })
    }

    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Replace the watched set
    pub fn watch_files(&mut self, paths: &[PathBuf]) -> Result<(), WatchError> {
        self.unwatch_all();
        for path in paths {
            self.watcher.watch(path, RecursiveMode::NonRecursive)?;
            self.watched.push(path.clone());
        }
        tracing::debug!("Watching {} file(s)", self.watched.len());
        Ok(())
    }

    pub fn unwatch_all(&mut self) {
        for path in self.watched.drain(..) {
            if let Err(e) = self.watcher.unwatch(&path) {
                tracing::debug!("Failed to unwatch {}: {e}", path.display());
            }
        }
        // Drop events that belong to the previous set
        while self.rx.try_recv().is_ok() {}
    }

    fn is_watched(&self, path: &Path) -> bool {
        self.watched.iter().any(|w| w == path)
    }

    /// Drain pending events and return each modified watched file once
    pub fn changed_files(&self) -> Vec<PathBuf> {
        let mut changed = BTreeSet::new();
        for event in self.rx.try_iter() {
            match event {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    changed.extend(event.paths.into_iter().filter(|p| self.is_watched(p)));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("File watcher error: {e}"),
            }
        }
        changed.into_iter().collect()
    }
}
