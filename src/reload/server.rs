//! WebSocket listener for live reload.
//!
//! Accepts TCP connections on the live-reload port and hands each one to
//! its own connection thread, which performs the upgrade and registers
//! with the [`ReloadHub`].

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::actor::ws::{ReloadHub, serve_connection};
use crate::core::Shutdown;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Sleep between accept polls while idle
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Bind the live-reload listener and start its accept thread.
///
/// Returns the port actually bound (the next free one if `base_port` is
/// taken) and the accept thread handle. The thread exits on shutdown;
/// connection threads close their sockets on their own.
pub fn start_reload_server(
    interface: IpAddr,
    base_port: u16,
    hub: Arc<ReloadHub>,
    shutdown: Shutdown,
) -> Result<(u16, JoinHandle<()>)> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener
        .set_nonblocking(true)
        .context("Failed to configure live reload listener")?;

    let handle = std::thread::Builder::new()
        .name("livewasm-reload".into())
        .spawn(move || accept_loop(&listener, &hub, &shutdown))
        .context("Failed to spawn live reload listener")?;

    Ok((actual_port, handle))
}

fn accept_loop(listener: &TcpListener, hub: &Arc<ReloadHub>, shutdown: &Shutdown) {
    while !shutdown.is_triggered() {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("reload"; "connection from {}", addr);

                let hub = Arc::clone(hub);
                let shutdown = shutdown.clone();
                if let Err(e) = std::thread::Builder::new()
                    .name(format!("livewasm-ws-{addr}"))
                    .spawn(move || serve_connection(stream, hub, shutdown))
                {
                    crate::log!("reload"; "cannot spawn connection thread: {}", e);
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                crate::log!("reload"; "accept error: {}", e);
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
    crate::debug!("reload"; "listener stopped");
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind live reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
