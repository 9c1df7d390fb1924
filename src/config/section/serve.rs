//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port for the output directory
//! live_port = 3001            # WebSocket port for live reload
//! dir = "server"              # Directory served over HTTP
//! open = true                 # Open the browser on start
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind, shared by both listeners.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port the page connects to for reload messages.
    pub live_port: u16,

    /// Directory served over HTTP, relative to the root.
    pub dir: PathBuf,

    /// Open the default browser once the HTTP server is up.
    pub open: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            live_port: 3001,
            dir: PathBuf::from("server"),
            open: true,
        }
    }
}

impl ServeConfig {
    pub const PORT: FieldPath = FieldPath::new("serve.port");
    pub const LIVE_PORT: FieldPath = FieldPath::new("serve.live_port");
    pub const DIR: FieldPath = FieldPath::new("serve.dir");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port != 0 && self.port == self.live_port {
            diag.error_with_hint(
                Self::LIVE_PORT,
                format!("same as `serve.port` ({})", self.port),
                "use a different port for live reload, e.g. port + 1",
            );
        }

        if self.dir.as_os_str().is_empty() {
            diag.error(Self::DIR, "must not be empty");
        }
    }
}
