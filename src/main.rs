use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

mod config;
mod handler;
mod http;
mod logger;
mod server;
mod storage;

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG: &str = "config";

fn main() {
    if let Err(e) = run() {
        logger::log_fatal(&e.to_string());
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let root = cfg.downloads_dir();
    config::prepare_downloads_dir(&root)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, root))
}

async fn async_main(cfg: config::Config, root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    logger::log_server_start(&addr, &root, &cfg);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    let state = Arc::new(config::AppState::new(cfg, root));
    server::start_server_loop(listener, state, shutdown).await;

    logger::log_info("Server stopped");
    Ok(())
}
