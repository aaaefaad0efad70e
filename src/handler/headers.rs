//! Response identification and CORS headers
//!
//! Applied to every exchange before any other stage touches the response.

use crate::config::HttpConfig;
use crate::error::PipelineError;
use crate::http::{IncomingRequest, ResponseWriter};
use hyper::header::{
    HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ETAG, ORIGIN, SERVER,
};

pub const X_BACKEND_HOST: HeaderName = HeaderName::from_static("x-backend-host");

const ALLOW_METHODS: &str = "GET, POST, HEAD";
const ALLOW_HEADERS: &str = "Content-Type";
/// Allowed origin when the request names neither an origin nor a host
const ANY_ORIGIN: &str = "*";

/// Values identifying this server, resolved once at startup
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    server: HeaderValue,
    backend_host: HeaderValue,
}

impl ServerIdentity {
    pub fn from_config(config: &HttpConfig) -> Result<Self, PipelineError> {
        let backend_host = config
            .backend_host
            .clone()
            .unwrap_or_else(local_hostname);
        Ok(Self {
            server: HeaderValue::from_str(&config.server_name)?,
            backend_host: HeaderValue::from_str(&backend_host)?,
        })
    }
}

/// Best-effort machine hostname
fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/proc/sys/kernel/hostname").ok())
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Value for `Access-Control-Allow-Origin`; never fails, even on a malformed request
fn allow_origin(request: &IncomingRequest) -> HeaderValue {
    if let Some(value) = request.headers().get(ORIGIN) {
        return value.clone();
    }
    request
        .origin()
        .and_then(|origin| HeaderValue::from_str(&origin).ok())
        .unwrap_or(HeaderValue::from_static(ANY_ORIGIN))
}

/// Write the unconditional headers
///
/// Works from the raw request so a request that later fails to parse still
/// carries them.
pub fn apply(
    request: &IncomingRequest,
    identity: &ServerIdentity,
    res: &mut ResponseWriter,
) -> Result<(), PipelineError> {
    // Conditional caching is switched off on purpose
    res.set_header(ETAG, HeaderValue::from_static("false"))?;
    res.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin(request))?;
    res.set_header(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    )?;
    res.set_header(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    )?;
    res.set_header(SERVER, identity.server.clone())?;
    res.set_header(X_BACKEND_HOST, identity.backend_host.clone())?;
    Ok(())
}
