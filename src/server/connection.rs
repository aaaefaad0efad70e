// Connection handling module
// Serves one accepted TCP connection through the request pipeline

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;

use crate::error::PipelineError;
use crate::handler::{error, Pipeline};
use crate::http::IncomingRequest;

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive
/// 3. Serves every request on the connection with the pipeline
/// 4. Registers the connection with the graceful shutdown watcher
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `pipeline` - Shared request pipeline
/// * `keep_alive` - Whether to keep the connection open between requests
/// * `graceful` - Shutdown watcher tracking in-flight connections
pub fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    pipeline: Arc<Pipeline>,
    keep_alive: bool,
    graceful: &GracefulShutdown,
) {
    let io = TokioIo::new(stream);
    let logger = pipeline.logger().clone();

    let mut builder = http1::Builder::new();
    builder.keep_alive(keep_alive);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| {
            let pipeline = Arc::clone(&pipeline);
            async move {
                // Plain TCP: TLS terminates in front of this server
                let request = IncomingRequest::from_hyper(req, peer_addr, false);
                Ok::<_, Infallible>(pipeline.handle(request).await)
            }
        }),
    );
    let conn = graceful.watch(conn);

    tokio::spawn(async move {
        if let Err(err) = conn.await {
            error::handle_error(&PipelineError::Transport(err), None, &logger);
        }
    });
}
