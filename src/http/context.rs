//! Per-request derived context
//!
//! The validated host and parsed URL are computed once and shared by the
//! static asset and router stages.

use crate::error::PipelineError;
use crate::http::request::IncomingRequest;
use url::Url;

/// Characters that would let a host header smuggle path or credentials into the URL
const HOST_FORBIDDEN: &[char] = &['/', '\\', '?', '#', '@', ' '];

/// Request context encapsulating information needed by the routing stages
#[derive(Debug)]
pub struct RequestContext<'a> {
    request: &'a IncomingRequest,
    url: Url,
}

impl<'a> RequestContext<'a> {
    /// Derive host and URL for a request
    pub fn derive(request: &'a IncomingRequest) -> Result<Self, PipelineError> {
        let protocol = request.protocol();
        let host = request
            .host()
            .ok_or_else(|| PipelineError::MalformedRequest("missing host header".to_string()))?;

        if host.contains(HOST_FORBIDDEN) {
            return Err(PipelineError::MalformedRequest(format!(
                "invalid host header '{host}'"
            )));
        }

        let raw_url = request.raw_url();
        let url = Url::parse(&format!("{protocol}://{host}{raw_url}")).map_err(|e| {
            PipelineError::MalformedRequest(format!("cannot parse '{raw_url}' on host '{host}': {e}"))
        })?;

        Ok(Self { request, url })
    }

    pub const fn request(&self) -> &'a IncomingRequest {
        self.request
    }

    /// Normalized path, still percent-encoded
    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// Query parameters in order, duplicates preserved
    pub fn search_params(&self) -> Vec<(String, String)> {
        self.url.query_pairs().into_owned().collect()
    }
}
