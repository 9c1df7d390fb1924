//! Shutdown signal for serve mode.
//!
//! One `Shutdown` is created by the serve command and cloned into every
//! long-running piece: the watch/build pipeline (async, waits on a `watch`
//! channel), the reload listener and connection threads (sync, poll the
//! flag), and the Ctrl+C handler that fires it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tiny_http::Server;
use tokio::sync::watch;

/// Cloneable, fire-once shutdown signal.
#[derive(Clone)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
        }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.tx.send_replace(true);
    }

    /// Check if shutdown has been requested
    ///
    /// Relaxed is enough: worst case a poll loop runs one more iteration.
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // Sender lives in self, so wait_for can only fail after trigger anyway
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the Ctrl+C handler. Call once, after the HTTP server is bound.
///
/// The handler fires `shutdown` and unblocks the request loop so `serve`
/// can stop the pipeline and return.
pub fn setup_shutdown_handler(shutdown: Shutdown, server: Arc<Server>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        if shutdown.is_triggered() {
            // Second Ctrl+C: stop waiting for a hung build
            std::process::exit(130);
        }
        crate::log!("serve"; "shutting down...");
        shutdown.trigger();
        server.unblock();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_shared_by_clones() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        assert!(!clone.is_triggered());

        shutdown.trigger();
        assert!(clone.is_triggered());

        // Idempotent
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_wait_resolves_after_trigger() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("wait() should resolve after trigger")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(200), shutdown.wait())
            .await
            .expect("already triggered");
    }
}
