//! Process-wide shutdown state.
//!
//! `SHUTDOWN` records whether Ctrl+C was received. A registered server is
//! unblocked so the request loop can drain and return; a render batch polls
//! `is_shutdown()` between jobs so its browser is still closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// A command that polls `is_shutdown()` itself is running
static GRACEFUL: AtomicBool = AtomicBool::new(false);

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a server has been registered:
/// - After `register_server()`: unblock the request loop
/// - After `enable_graceful_shutdown()`: only record the request
/// - Otherwise: exit immediately
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else if GRACEFUL.load(Ordering::SeqCst) {
            crate::log!("render"; "interrupted, closing browser...");
        } else {
            std::process::exit(130);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Let the running command observe Ctrl+C instead of exiting
pub fn enable_graceful_shutdown() {
    GRACEFUL.store(true, Ordering::SeqCst);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
