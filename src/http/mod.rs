//! HTTP protocol layer module
//!
//! Request/response types and helpers shared by the pipeline stages.

pub mod context;
pub mod mime;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use context::RequestContext;
pub use request::IncomingRequest;
pub use response::{ResponseBody, ResponseSummary, ResponseWriter, TrackedBody};
