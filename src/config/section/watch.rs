//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! enable = true       # Rebuild on source changes
//! window_ms = 500     # Quiet window: at most one rebuild per window
//! rescan_ms = 1000    # Look for new source files this often (0 = never)
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// File watching and rebuild pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enable: bool,

    /// Debounce window in milliseconds.
    pub window_ms: u64,

    /// Rescan interval in milliseconds, `0` disables rescanning.
    pub rescan_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enable: true,
            window_ms: 500,
            rescan_ms: 1000,
        }
    }
}

impl WatchConfig {
    pub const WINDOW_MS: FieldPath = FieldPath::new("watch.window_ms");
    pub const RESCAN_MS: FieldPath = FieldPath::new("watch.rescan_ms");

    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub const fn rescan_interval(&self) -> Option<Duration> {
        if self.rescan_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.rescan_ms))
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.window_ms == 0 {
            diag.error_with_hint(
                Self::WINDOW_MS,
                "must be greater than zero",
                "500 rebuilds at most twice a second",
            );
        }

        if self.rescan_ms != 0 && self.rescan_ms < self.window_ms {
            diag.warn(
                Self::RESCAN_MS,
                format!("shorter than `watch.window_ms` ({})", self.window_ms),
                "rescans only matter once per window; a longer interval walks the tree less",
            );
        }
    }
}
