//! Request handler module
//!
//! The stages of the request pipeline and the pipeline that runs them.

pub mod access_log;
pub mod error;
pub mod headers;
pub mod pipeline;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use pipeline::Pipeline;
