//! Debounced Trigger
//!
//! Converts a stream of dirty marks into at most one rebuild per window.
//!
//! ```text
//! every window:  DirtyFlag::take ──set──> Builder::build ──ok──> ReloadHub::broadcast
//!                       │                       │
//!                     clear                   failed
//!                       ↓                       ↓
//!                     idle               status block only
//! ```
//!
//! The cycle is awaited inside the tick, so builds never overlap and a
//! long build simply delays the next tick. Marks that land during a build
//! stay in the flag and are picked up by the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::actor::builder::{BuildError, Builder};
use crate::actor::fs::DirtyFlag;
use crate::actor::ws::ReloadHub;
use crate::core::Shutdown;
use crate::logger::{status_compiling, status_error, status_success};
use crate::reload::message::ReloadMessage;


/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Flag was clear, nothing ran
    Idle,
    /// Build succeeded; `notified` clients were sent a reload
    Built { notified: usize },
    /// Build failed; nobody was notified
    Failed,
}

pub struct DebouncedTrigger {
    dirty: DirtyFlag,
    builder: Arc<dyn Builder>,
    hub: Arc<ReloadHub>,
    window: Duration,
    /// Appended to the success status (local / network URLs)
    banner: String,
}

impl DebouncedTrigger {
    pub fn new(
        dirty: DirtyFlag,
        builder: Arc<dyn Builder>,
        hub: Arc<ReloadHub>,
        window: Duration,
    ) -> Self {
        Self {
            dirty,
            builder,
            hub,
            window,
            banner: String::new(),
        }
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// One window elapsed: rebuild if anything changed since the last tick.
    pub async fn tick(&self) -> CycleOutcome {
        if !self.dirty.take() {
            return CycleOutcome::Idle;
        }
        self.run_cycle().await
    }

    /// Build, then broadcast on success.
    pub async fn run_cycle(&self) -> CycleOutcome {
        status_compiling();

        let builder = Arc::clone(&self.builder);
        let result = tokio::task::spawn_blocking(move || builder.build())
            .await
            .unwrap_or_else(|e| Err(BuildError::Aborted(e.to_string())));

        match result {
            Ok(report) => {
                let notified = self.hub.broadcast(&ReloadMessage::reload());
                status_success(&format!(
                    "compiled successfully in {:.2?}{}",
                    report.elapsed, self.banner
                ));
                CycleOutcome::Built { notified }
            }
            Err(e) => {
                status_error(&e.to_string(), e.diagnostics().unwrap_or_default());
                CycleOutcome::Failed
            }
        }
    }

    /// Tick every window until shutdown.
    ///
    /// The first tick fires immediately, so a flag marked before `run`
    /// produces the initial build without waiting a window.
    pub async fn run(self, shutdown: Shutdown) {
        let mut interval = tokio::time::interval(self.window);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        crate::debug!("build"; "trigger stopped");
    }
}
