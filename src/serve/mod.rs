//! Asset Serving Handler: sidecar assets over HTTP.
//!
//! # Module Structure
//!
//! - `route` - URL segments -> `Route`
//! - `handler` - pure `handle(ctx, method, url) -> Reply`
//! - `response` - writes a `Reply` to a `tiny_http` request
//! - `lifecycle` - binding with port retry

mod handler;
mod lifecycle;
mod response;
mod route;


pub use handler::{Reply, handle};
pub use route::{AssetRoute, Route};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Request, Server};

use crate::config::ServeConfig;
use crate::core::{self, SiteContext};
use crate::log;

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    threads: usize,
}

/// Bind the HTTP server without starting the request loop
pub fn bind(config: &ServeConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.interface, config.port)?;
    Ok(BoundServer {
        server: Arc::new(server),
        addr,
        threads: config.threads.max(1),
    })
}

impl BoundServer {
    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle for unblocking the request loop from another thread.
    pub fn shutdown_handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Start the request loop (blocking until the server is unblocked).
    pub fn run(self, ctx: Arc<SiteContext>) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("sidecar-http-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        for request in self.server.incoming_requests() {
            let ctx = Arc::clone(&ctx);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &ctx) {
                    log!("serve"; "request error: {e}");
                }
            });
        }
        Ok(())
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &SiteContext) -> Result<()> {
    if core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let reply = handle(ctx, request.method(), request.url());
    response::respond(request, reply)
}
