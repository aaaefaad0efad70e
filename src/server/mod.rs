// Server module entry point
// Accept loop, per-connection serving and graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::handler::Pipeline;

// Re-export commonly used items
pub use connection::handle_connection;
pub use listener::create_listener;
pub use signal::shutdown_signal;

/// Accept connections until `shutdown` resolves, then drain in-flight ones
pub async fn run(
    listener: TcpListener,
    pipeline: Arc<Pipeline>,
    config: &ServerConfig,
    shutdown: impl Future<Output = ()>,
) {
    let logger = pipeline.logger().clone();
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        handle_connection(
                            stream,
                            peer_addr,
                            Arc::clone(&pipeline),
                            config.keep_alive,
                            &graceful,
                        );
                    }
                    Err(e) => {
                        logger.error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                break;
            }
        }
    }

    // Stop accepting before waiting on open connections
    drop(listener);

    let timeout = Duration::from_secs(config.shutdown_timeout);
    if tokio::time::timeout(timeout, graceful.shutdown()).await.is_ok() {
        logger.info("All connections closed, shutdown complete");
    } else {
        logger.warn(&format!(
            "Shutdown timeout after {} seconds, closing remaining connections",
            timeout.as_secs()
        ));
    }
}
