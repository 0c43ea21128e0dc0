use std::sync::Arc;
use std::time::Duration;

mod config;
mod dispatch;
mod handler;
mod http;
mod logger;
mod routing;
mod server;
mod storage;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg.logging).map_err(|e| e as Box<dyn std::error::Error>)?;

    // Worker thread count follows `server.workers`, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    // The root must exist before the first request arrives
    let upload_root = storage::UploadRoot::ensure(&cfg.storage.upload_dir).await?;
    let listener = server::create_listener(addr, cfg.server.backlog)?;

    let state = Arc::new(config::AppState::new(cfg, upload_root));
    logger::log_server_start(&addr, &state);

    let drain_timeout = Duration::from_secs(state.config.performance.shutdown_timeout);
    server::run(listener, state, server::signal::shutdown_signal(), drain_timeout).await?;
    tracing::info!("Server stopped");
    Ok(())
}
