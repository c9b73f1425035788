//! Core process state and the shared site context.

mod context;
mod state;

pub use context::SiteContext;
pub use state::{enable_graceful_shutdown, is_shutdown, register_server, setup_shutdown_handler};
