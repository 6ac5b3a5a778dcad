use std::path::PathBuf;
use std::sync::Arc;

use siteserve::build::prepare_site;
use siteserve::config::Config;
use siteserve::handler::RequestHandler;
use siteserve::logger;
use siteserve::resolver::PathResolver;
use siteserve::server::{self, ServerState, SignalHandler};

/// Config name used when none is given on the command line
const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_name = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = Config::load_from(&config_name)?;
    logger::init(&cfg)?;

    // The generator runs to completion before any runtime thread exists
    let site_root = prepare_site(&cfg.site).map_err(|e| {
        logger::log_error(&format!("Site build failed: {e}"));
        e
    })?;

    // Build the runtime, honouring the configured worker count
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, site_root))
}

async fn async_main(cfg: Config, site_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let resolver = PathResolver::new(&site_root);

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg, resolver.root());

    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    let state = Arc::new(ServerState::new(RequestHandler::new(resolver), cfg));

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, Arc::clone(&signals.shutdown)))
        .await;

    logger::log_info("Server stopped");
    Ok(())
}
