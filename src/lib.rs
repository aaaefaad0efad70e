//! ACL ingress backend
//!
//! A single-request HTTP pipeline: identification and CORS headers, static
//! assets, structured access logging, a two-route echo router and error
//! translation, served over hyper.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
