//! Live Reload Message Protocol
//!
//! The server pushes exactly one message type to browser clients:
//!
//! ```json
//! {"cmd":"reload"}
//! ```
//!
//! The page shell reloads itself when it sees `cmd == "reload"`. Nothing is
//! expected from the client; inbound frames only prove liveness.

use serde::{Deserialize, Serialize};

/// Command carried by a [`ReloadMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Full page reload
    Reload,
}

/// Message sent over the WebSocket after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadMessage {
    cmd: Command,
}

impl ReloadMessage {
    /// Create a reload message
    pub const fn reload() -> Self {
        Self {
            cmd: Command::Reload,
        }
    }

    #[cfg(test)]
    pub const fn command(&self) -> Command {
        self.cmd
    }

    /// Serialize to the wire format
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"cmd":"reload"}"#.to_string())
    }

    /// Parse from the wire format
    #[cfg(test)]
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}
