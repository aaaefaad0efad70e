use std::sync::Arc;

use acl_ingress::config::{Config, DEFAULT_CONFIG_PATH};
use acl_ingress::handler::Pipeline;
use acl_ingress::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // Create the Tokio runtime, sizing the worker pool from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("Using {workers} worker threads"));
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = server::create_listener(addr)?;
    let pipeline = Arc::new(Pipeline::from_config(&cfg, logger::global().clone())?);

    logger::log_server_start(&addr, &cfg);

    server::run(listener, pipeline, &cfg.server, server::shutdown_signal()).await;
    Ok(())
}
