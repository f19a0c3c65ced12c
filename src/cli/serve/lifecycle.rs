//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tiny_http::Server;

use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the interface and port, trying the next ports if it is taken.
///
/// Port 0 lets the OS pick, so it is tried once. Returns the address that
/// was actually bound.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let attempts = if base_port == 0 { 1 } else { MAX_PORT_RETRIES };
    let mut last_error = None;

    for offset in 0..attempts {
        let port = base_port.saturating_add(offset);
        let requested = SocketAddr::new(interface, port);

        match Server::http(requested) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let addr = server.server_addr().to_ip().unwrap_or(requested);
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind {} after {} attempt(s) (ports {}-{}): {}",
        interface,
        attempts,
        base_port,
        base_port.saturating_add(attempts - 1),
        last_error.map_or_else(String::new, |e| e.to_string())
    ))
}

/// Wait for the watcher thread to finish (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_bind_port_zero_reports_real_port() {
        let (_server, addr) = bind_with_retry(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_bind_retries_next_port() {
        let (_first, taken) = bind_with_retry(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let (_second, addr) = bind_with_retry(taken.ip(), taken.port()).unwrap();
        assert_ne!(addr.port(), taken.port());
    }
}
