//! Local content server.
//!
//! Serves the registry's enabled items by case-insensitive name and a
//! freshly rendered listing at `/`. One accept thread hands requests to a
//! small rayon pool; every request reads its own registry snapshot.
//!
//! ```text
//! Stopped ──start()──> Starting ──bind ok──> Running(addr)
//!    ^                    │                      │
//!    └────bind error──────┘<──────stop()─────────┘
//! ```

mod lifecycle;
mod listing;
mod path;
mod response;
mod route;

use std::{
    io,
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tiny_http::{Request, Server};

use crate::config::ServeConfig;
use crate::registry::ContentRegistry;
use crate::source::ContentSource;
use crate::{debug, log};

/// Lifecycle state of a `LocalServer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Running(SocketAddr),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to create request workers")]
    Workers(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn accept thread")]
    Spawn(#[source] io::Error),
}

/// Everything a request worker needs.
pub(crate) struct RequestContext {
    registry: Arc<ContentRegistry>,
    source: Arc<dyn ContentSource>,
    addr: SocketAddr,
}

/// A bound listener and its accept thread.
struct Listener {
    server: Arc<Server>,
    addr: SocketAddr,
    thread: JoinHandle<()>,
}

/// Embedded HTTP server over a shared registry.
pub struct LocalServer {
    registry: Arc<ContentRegistry>,
    source: Arc<dyn ContentSource>,
    config: ServeConfig,
    state: RwLock<ServerState>,
    listener: Mutex<Option<Listener>>,
}

impl LocalServer {
    pub fn new(
        registry: Arc<ContentRegistry>,
        source: Arc<dyn ContentSource>,
        config: ServeConfig,
    ) -> Self {
        Self {
            registry,
            source,
            config,
            state: RwLock::new(ServerState::Stopped),
            listener: Mutex::new(None),
        }
    }

    /// Bind and start serving. A running listener is stopped first.
    ///
    /// On error the server is left `Stopped`.
    pub fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut slot = self.listener.lock();
        if let Some(previous) = slot.take() {
            Self::shutdown(previous);
        }
        *self.state.write() = ServerState::Starting;

        match self.spawn_listener() {
            Ok(listener) => {
                let addr = listener.addr;
                *slot = Some(listener);
                *self.state.write() = ServerState::Running(addr);
                log!("serve"; "http://{}", addr);
                Ok(addr)
            }
            Err(e) => {
                *self.state.write() = ServerState::Stopped;
                Err(e)
            }
        }
    }

    /// Stop serving and release the port. Safe to call when stopped.
    pub fn stop(&self) {
        let previous = self.listener.lock().take();
        if let Some(listener) = previous {
            let addr = listener.addr;
            Self::shutdown(listener);
            log!("serve"; "stopped {}", addr);
        }
        *self.state.write() = ServerState::Stopped;
    }

    pub fn state(&self) -> ServerState {
        *self.state.read()
    }

    /// Bound address while running.
    pub fn addr(&self) -> Option<SocketAddr> {
        match self.state() {
            ServerState::Running(addr) => Some(addr),
            _ => None,
        }
    }

    /// Browser URL for the first enabled HTML item, else the listing.
    pub fn preview_url(&self) -> Option<String> {
        let addr = self.addr()?;
        let base = format!("http://{}/", display_host(addr));
        Some(match self.registry.first_enabled_html() {
            Some(item) => format!("{base}{}", listing_href(&item.name)),
            None => base,
        })
    }

    fn spawn_listener(&self) -> Result<Listener, ServerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .thread_name(|i| format!("htmlcomb-http-{i}"))
            .panic_handler(|_| log!("serve"; "request worker panicked"))
            .build()?;

        let (server, addr) = lifecycle::bind_with_retry(self.config.addr())?;
        let server = Arc::new(server);
        let ctx = Arc::new(RequestContext {
            registry: Arc::clone(&self.registry),
            source: Arc::clone(&self.source),
            addr,
        });

        let thread = thread::Builder::new()
            .name("htmlcomb-accept".into())
            .spawn({
                let server = Arc::clone(&server);
                move || run_request_loop(&server, &pool, &ctx)
            })
            .map_err(ServerError::Spawn)?;

        Ok(Listener {
            server,
            addr,
            thread,
        })
    }

    fn shutdown(listener: Listener) {
        listener.server.unblock();
        let _ = listener.thread.join();
        // Last reference: dropping it closes the socket.
        drop(listener.server);
    }
}

impl Drop for LocalServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_request_loop(server: &Server, pool: &rayon::ThreadPool, ctx: &Arc<RequestContext>) {
    for request in server.incoming_requests() {
        let ctx = Arc::clone(ctx);
        pool.spawn(move || handle_request(request, &ctx));
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &RequestContext) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let reply = route::route(&method, &url, ctx);
    let status = reply.status();
    if let Err(e) = response::respond(request, reply) {
        debug!("serve"; "{} {} failed to send: {}", method, url, e);
    }
    debug!("serve"; "{} {} {}", method, url, status);
}

/// `0.0.0.0` is not browsable; point the browser at loopback instead.
fn display_host(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("localhost:{}", addr.port())
    } else {
        addr.to_string()
    }
}

fn listing_href(name: &str) -> String {
    use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
    const KEEP: &percent_encoding::AsciiSet = &NON_ALPHANUMERIC
        .remove(b'.')
        .remove(b'-')
        .remove(b'_')
        .remove(b'~');
    utf8_percent_encode(name, KEEP).to_string()
}
