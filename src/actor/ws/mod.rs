//! Reload Hub - Live Reload Fan-out
//!
//! This component is responsible for:
//! - Keeping the registry of connected browser clients
//! - Pushing one reload message into every client's own outbound queue
//! - Dropping clients whose connection has gone away
//!
//! # Architecture
//!
//! ```text
//!                          ┌── queue ──> connection thread ──> Browser
//! Trigger --broadcast--> Hub ── queue ──> connection thread ──> Browser
//!                          └── queue ──> connection thread ──> Browser
//! ```
//!
//! The hub never touches a socket. Each connection thread owns its socket
//! and drains its own queue, so one slow client cannot hold up the others.

mod client_io;
mod delivery;


use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::reload::message::ReloadMessage;

pub use client_io::{ConnState, UPGRADE_PATH, serve_connection};

/// Pending reloads per connection. One pending reload covers any later
/// build, so a full queue means the client is already up to date.
const OUTBOUND_CAPACITY: usize = 1;

pub type ClientId = u64;

/// Registry entry: the sending half of one connection's outbound queue.
struct ClientHandle {
    tx: Sender<ReloadMessage>,
    peer: Option<SocketAddr>,
}

/// Why an upgrade request was not accepted.
#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("no upgrade endpoint at this path")]
    WrongPath,

    #[error("bad upgrade request: {0}")]
    Handshake(String),

    #[error("handshake timed out")]
    TimedOut,
}

/// Registry of open connections.
pub struct ReloadHub {
    clients: Mutex<FxHashMap<ClientId, ClientHandle>>,
    next_id: AtomicU64,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a connection. Returns its id and the receiving half of its
    /// outbound queue.
    pub fn register(&self, peer: Option<SocketAddr>) -> (ClientId, Receiver<ReloadMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = channel::bounded(OUTBOUND_CAPACITY);

        let mut clients = self.clients.lock();
        clients.insert(id, ClientHandle { tx, peer });
        crate::debug!("reload"; "client {} connected{} (total: {})",
            id, peer.map(|p| format!(" from {p}")).unwrap_or_default(), clients.len());

        (id, rx)
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn deregister(&self, id: ClientId) -> bool {
        let mut clients = self.clients.lock();
        let removed = clients.remove(&id).is_some();
        if removed {
            crate::debug!("reload"; "client {} disconnected (total: {})", id, clients.len());
        }
        removed
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
