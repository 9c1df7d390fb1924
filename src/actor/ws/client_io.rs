use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{Receiver, TryRecvError};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::protocol::Message;
use tungstenite::{HandshakeError, WebSocket};

use crate::core::Shutdown;
use crate::reload::message::ReloadMessage;

use super::{ClientId, ReloadHub, UpgradeError};

/// The only path that accepts an upgrade.
pub const UPGRADE_PATH: &str = "/ws";

/// Upper bound on the HTTP upgrade exchange.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Read timeout between outbound queue checks.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle of one client connection. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Accepted, handshake in progress, not registered
    Connecting,
    /// Registered with the hub, receive loop running
    Open,
    /// Deregistered (terminal)
    Closed,
}

impl ConnState {
    pub fn can_advance_to(self, next: ConnState) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open)
                | (Self::Connecting, Self::Closed)
                | (Self::Open, Self::Closed)
        )
    }
}

/// One accepted socket: its state, and once open, its hub registration.
struct Connection {
    peer: Option<SocketAddr>,
    state: ConnState,
    id: Option<ClientId>,
}

impl Connection {
    fn new(peer: Option<SocketAddr>) -> Self {
        Self {
            peer,
            state: ConnState::Connecting,
            id: None,
        }
    }

    fn advance(&mut self, next: ConnState) {
        debug_assert!(self.state.can_advance_to(next), "{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn open(&mut self, hub: &ReloadHub) -> Receiver<ReloadMessage> {
        let (id, rx) = hub.register(self.peer);
        self.id = Some(id);
        self.advance(ConnState::Open);
        rx
    }

    fn close(&mut self, hub: &ReloadHub) {
        if self.state == ConnState::Closed {
            return;
        }
        if let Some(id) = self.id.take() {
            hub.deregister(id);
        }
        self.advance(ConnState::Closed);
    }
}

/// Handle one accepted TCP stream until the client leaves or shutdown.
///
/// Runs on its own thread. Upgrade failures are answered with a client
/// error and never registered.
pub fn serve_connection(stream: TcpStream, hub: Arc<ReloadHub>, shutdown: Shutdown) {
    let mut conn = Connection::new(stream.peer_addr().ok());

    let mut ws = match accept_upgrade(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::debug!("reload"; "upgrade rejected{}: {}",
                conn.peer.map(|p| format!(" ({p})")).unwrap_or_default(), e);
            conn.close(&hub);
            return;
        }
    };

    if let Err(e) = ws
        .get_ref()
        .set_read_timeout(Some(POLL_INTERVAL))
        .and_then(|()| ws.get_ref().set_write_timeout(Some(WRITE_TIMEOUT)))
    {
        crate::debug!("reload"; "cannot configure socket: {}", e);
        conn.close(&hub);
        return;
    }

    let outbound = conn.open(&hub);
    receive_loop(&mut ws, &outbound, &shutdown);
    conn.close(&hub);
}

/// Perform the HTTP upgrade on `/ws`.
///
/// Another path is answered `404` (written by the handshake itself); any
/// other failure gets a plain `400`.
pub(super) fn accept_upgrade(stream: TcpStream) -> Result<WebSocket<TcpStream>, UpgradeError> {
    stream
        .set_nonblocking(false)
        .and_then(|()| stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)))
        .map_err(|e| UpgradeError::Handshake(e.to_string()))?;
    // Kept to answer failures tungstenite does not answer itself
    let responder = stream.try_clone().ok();

    let check_path = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() == UPGRADE_PATH {
            return Ok(resp);
        }
        let mut err = ErrorResponse::new(Some("not found".to_string()));
        *err.status_mut() = StatusCode::NOT_FOUND;
        Err(err)
    };

    match tungstenite::accept_hdr(stream, check_path) {
        Ok(ws) => Ok(ws),
        Err(HandshakeError::Interrupted(_)) => Err(UpgradeError::TimedOut),
        // Already answered by the handshake
        Err(HandshakeError::Failure(tungstenite::Error::Http(resp)))
            if resp.status() == StatusCode::NOT_FOUND =>
        {
            Err(UpgradeError::WrongPath)
        }
        // Only a callback rejection (`Error::Http`) is written back by the
        // handshake. Parse errors, missing upgrade headers (`Error::Protocol`)
        // and I/O failures return before any response bytes are sent, so this
        // is the socket's only reply.
        Err(HandshakeError::Failure(e)) => {
            if let Some(mut responder) = responder {
                let _ = responder.write_all(
                    b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                );
                let _ = responder.flush();
            }
            Err(UpgradeError::Handshake(e.to_string()))
        }
    }
}

/// Alternate between draining the outbound queue and a short read.
///
/// Inbound frames are only a liveness signal. Returns when the client
/// closes, the transport fails, or shutdown is requested.
fn receive_loop(
    ws: &mut WebSocket<TcpStream>,
    outbound: &Receiver<ReloadMessage>,
    shutdown: &Shutdown,
) {
    loop {
        if shutdown.is_triggered() {
            let _ = ws.close(None);
            let _ = ws.flush();
            return;
        }

        match outbound.try_recv() {
            Ok(msg) => {
                if let Err(e) = ws.send(Message::Text(msg.to_json().into())) {
                    crate::debug!("reload"; "send failed: {}", e);
                    return;
                }
            }
            Err(TryRecvError::Empty) => {}
            // Hub dropped us
            Err(TryRecvError::Disconnected) => return,
        }

        match ws.read() {
            Ok(Message::Close(_)) => {
                // Queue the close reply
                let _ = ws.flush();
                return;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => return,
            Err(e) => {
                crate::debug!("reload"; "connection error: {}", e);
                return;
            }
        }
    }
}
