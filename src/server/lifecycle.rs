//! Listener binding.

use std::{io, net::SocketAddr, thread, time::Duration};

use tiny_http::Server;

use super::ServerError;
use crate::debug;

/// Maximum number of binding attempts on the configured port.
const MAX_BIND_ATTEMPTS: u32 = 10;

/// Pause between attempts; a just-stopped listener may still hold the port.
const BIND_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Bind `addr`, retrying the same port briefly.
///
/// Returns the server and the address actually bound (differs from `addr`
/// when port 0 was requested).
pub fn bind_with_retry(addr: SocketAddr) -> Result<(Server, SocketAddr), ServerError> {
    let mut attempt = 1;
    loop {
        match Server::http(addr) {
            Ok(server) => {
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) if attempt < MAX_BIND_ATTEMPTS => {
                debug!("serve"; "bind {} failed (attempt {}): {}", addr, attempt, e);
                attempt += 1;
                thread::sleep(BIND_RETRY_DELAY);
            }
            Err(e) => {
                return Err(ServerError::Bind {
                    addr,
                    source: io::Error::other(e),
                });
            }
        }
    }
}
