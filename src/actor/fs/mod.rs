//! Change Source
//!
//! Watches the tracked source files and marks the tree dirty on change.
//!
//! Architecture:
//! ```text
//! notify callback → std channel → bridge thread → tokio channel
//!                                                      ↓
//!                          ChangeSource::run ── filter ──→ DirtyFlag::mark
//!                                 ↑
//!                           rescan tick (new files, re-attach stale watches)
//! ```
//!
//! The Change Source never decides *what* to rebuild: any qualifying change
//! to any tracked file is enough to mark the whole tree dirty.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::core::Shutdown;
use crate::utils::path::display_relative;

// Dirty flag shared with the Debounced Trigger.
mod dirty;
// Path and event-kind filtering.
mod filter;
// Watched path bookkeeping and directory walk.
mod watch_set;

#[cfg(test)]
mod tests;

pub use dirty::DirtyFlag;
pub use filter::TRACKED_EXTENSION;
pub use watch_set::WatchSet;

/// Buffer between the notify bridge thread and the async loop
const EVENT_BUFFER: usize = 64;

/// Change Source - marks the tree dirty on source changes
pub struct ChangeSource {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: Option<std::sync::mpsc::Receiver<notify::Result<notify::Event>>>,
    /// Watcher handle (must be kept alive). `None` when the OS watcher could
    /// not be created; the source then runs degraded.
    watcher: Option<RecommendedWatcher>,
    watch_set: WatchSet,
    dirty: DirtyFlag,
    /// Period of the rescan tick, `None` disables it
    rescan_interval: Option<Duration>,
}

impl ChangeSource {
    /// Create the watcher and register the root plus every tracked file.
    ///
    /// Watch failures are logged, never returned: the rest of the process
    /// keeps running without change detection.
    pub fn new(root: PathBuf, dirty: DirtyFlag, rescan_interval: Option<Duration>) -> Self {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let watcher = match notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        }) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                crate::log!("watch"; "cannot create file watcher, changes will not be detected: {}", e);
                None
            }
        };

        let mut source = Self {
            notify_rx: Some(notify_rx),
            watcher,
            watch_set: WatchSet::new(root),
            dirty,
            rescan_interval,
        };
        source.attach_initial();
        source
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    /// Initial scan: root (non-recursive) plus every tracked file.
    fn attach_initial(&mut self) {
        let root = self.watch_set.root().to_path_buf();
        if let Some(watcher) = self.watcher.as_mut()
            && let Err(e) = watcher.watch(&root, RecursiveMode::NonRecursive)
        {
            crate::log!("watch"; "cannot watch {}: {}", root.display(), e);
        }

        for path in self.watch_set.discover() {
            self.register(path);
        }

        crate::debug!("watch"; "tracking {} .{} files under {}",
            self.watch_set.len(), TRACKED_EXTENSION, root.display());
    }

    /// Add a file to the watch set and attach its OS watch.
    fn register(&mut self, path: PathBuf) {
        let attached = self.attach(&path);
        self.watch_set.insert(path.clone());
        if !attached {
            self.watch_set.mark_stale(&path);
        }
    }

    fn attach(&mut self, path: &Path) -> bool {
        let Some(watcher) = self.watcher.as_mut() else {
            return false;
        };
        match watcher.watch(path, RecursiveMode::NonRecursive) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("watch"; "cannot watch {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Apply one notify event. Returns whether the tree was marked dirty.
    pub(super) fn handle_event(&mut self, event: &notify::Event) -> bool {
        if !filter::is_change_kind(&event.kind) {
            return false;
        }

        let root = self.watch_set.root().to_path_buf();
        let tracked: Vec<&PathBuf> = event
            .paths
            .iter()
            .filter(|path| filter::is_tracked(path, &root))
            .collect();
        if tracked.is_empty() {
            return false;
        }

        if filter::detaches_watch(&event.kind) {
            for path in &tracked {
                self.watch_set.mark_stale(path);
            }
        }

        crate::debug!("watch"; "{:?}: {}", event.kind,
            tracked.iter().map(|p| display_relative(p, &root)).collect::<Vec<_>>().join(", "));

        self.dirty.mark();
        true
    }

    /// Register tracked files created since the last scan.
    ///
    /// A newly discovered file counts as a change. Returns how many were
    /// added.
    pub(super) fn rescan(&mut self) -> usize {
        let found = self.watch_set.discover();
        let added = found.len();

        for path in found {
            crate::debug!("watch"; "new file: {}", display_relative(&path, self.watch_set.root()));
            self.register(path);
        }

        if added > 0 {
            self.dirty.mark();
        }
        added
    }

    /// Re-attach watches on tracked files that were removed and recreated
    /// (editors that save by renaming a temp file over the original).
    ///
    /// A recreated file's contents are unknown, so any re-attach marks the
    /// tree dirty. Returns how many watches were re-attached.
    pub(super) fn maintain(&mut self) -> usize {
        let mut reattached = 0;
        for path in self.watch_set.reattachable() {
            if self.attach(&path) {
                self.watch_set.mark_attached(&path);
                reattached += 1;
                crate::debug!("watch"; "re-attached watch: {}", display_relative(&path, self.watch_set.root()));
            }
        }

        if reattached > 0 {
            self.dirty.mark();
        }
        reattached
    }

    /// Run the change loop until shutdown or until the watcher channel
    /// closes.
    pub async fn run(mut self, shutdown: Shutdown) {
        let Some(notify_rx) = self.notify_rx.take() else {
            return;
        };

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(EVENT_BUFFER);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        let rescan_enabled = self.rescan_interval.is_some();
        let mut rescan = tokio::time::interval(
            self.rescan_interval.unwrap_or(Duration::from_secs(86400)),
        );
        rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; the initial scan already ran
        rescan.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                event = async_rx.recv() => match event {
                    Some(event) => {
                        self.handle_event(&event);
                    }
                    None => {
                        crate::log!("watch"; "file watcher stopped, changes will not be detected");
                        break;
                    }
                },
                _ = rescan.tick(), if rescan_enabled => {
                    self.maintain();
                    self.rescan();
                }
            }
        }

        crate::debug!("watch"; "stopped");
    }
}
