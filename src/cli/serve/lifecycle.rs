//! Server lifecycle management.

use crate::log;
use anyhow::Result;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                // Port 0 binds an ephemeral port; report the real one
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// URLs printed under "compiled successfully".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeUrls {
    pub local: String,
    /// Reachable from other machines; `None` when bound to loopback only
    pub network: Option<String>,
}

impl ServeUrls {
    pub fn new(addr: SocketAddr) -> Self {
        let port = addr.port();
        let local = format!("http://localhost:{port}");

        let network = match addr.ip() {
            ip if ip.is_loopback() => None,
            ip if ip.is_unspecified() => outbound_ip().map(|ip| http_url(ip, port)),
            ip => Some(http_url(ip, port)),
        };

        Self { local, network }
    }

    /// Status block suffix.
    pub fn banner(&self) -> String {
        let mut banner = format!("\n\n  Local:   {}", self.local);
        if let Some(network) = &self.network {
            banner.push_str(&format!("\n  Network: {network}"));
        }
        banner
    }
}

fn http_url(ip: IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(v4) => format!("http://{v4}:{port}"),
        IpAddr::V6(v6) => format!("http://[{v6}]:{port}"),
    }
}

/// Address of the interface that routes to the outside world.
///
/// Connecting a UDP socket sends no packets; it only selects a route.
fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}
