// Server module entry point
// Listener setup, connection handling, the accept loop and signals

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module file is mapped to server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::Config;
use crate::handler::RequestHandler;

// Re-export commonly used items
pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;
pub use signal::{start_signal_handler, SignalHandler};

/// State shared by every connection of one server
pub struct ServerState {
    pub handler: Arc<RequestHandler>,
    pub config: Config,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
}

impl ServerState {
    pub fn new(handler: RequestHandler, config: Config) -> Self {
        Self {
            handler: Arc::new(handler),
            config,
            active_connections: AtomicUsize::new(0),
        }
    }
}
