//! Incoming request representation
//!
//! Owned by one pipeline invocation and never mutated once built.
//! Repeated headers resolve to their first value everywhere.

use hyper::header::{AsHeaderName, HOST, ORIGIN};
use hyper::http::uri::PathAndQuery;
use hyper::{HeaderMap, Method, Uri};
use std::borrow::Cow;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    peer_addr: SocketAddr,
    encrypted: bool,
}

impl IncomingRequest {
    pub const fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        peer_addr: SocketAddr,
        encrypted: bool,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            peer_addr,
            encrypted,
        }
    }

    /// Build from a hyper request, discarding the body
    pub fn from_hyper<B>(req: hyper::Request<B>, peer_addr: SocketAddr, encrypted: bool) -> Self {
        let (parts, _body) = req.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, peer_addr, encrypted)
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Whether the transport carrying this request is encrypted
    pub const fn encrypted(&self) -> bool {
        self.encrypted
    }

    /// `https` on an encrypted transport, else `http`
    pub const fn protocol(&self) -> &'static str {
        if self.encrypted {
            "https"
        } else {
            "http"
        }
    }

    /// Host as sent: the `Host` header, else the authority of an absolute-form URI
    pub fn host(&self) -> Option<String> {
        self.header_str(HOST)
            .map(|h| h.trim().to_string())
            .or_else(|| self.uri.authority().map(|a| a.as_str().to_string()))
            .filter(|h| !h.is_empty())
    }

    /// Requester origin: the `origin` header, else `protocol://host`
    pub fn origin(&self) -> Option<String> {
        self.header_str(ORIGIN)
            .map(Cow::into_owned)
            .or_else(|| self.host().map(|host| format!("{}://{host}", self.protocol())))
    }

    /// Client address: leftmost `X-Forwarded-For` entry, else the peer IP
    pub fn remote_ip(&self) -> String {
        self.header_str("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
            .filter(|ip| !ip.is_empty())
            .unwrap_or_else(|| self.peer_addr.ip().to_string())
    }

    /// Raw path and query as received
    pub fn raw_url(&self) -> &str {
        self.uri.path_and_query().map_or("/", PathAndQuery::as_str)
    }

    /// First value of a header, lossily decoded
    pub fn header_str<K: AsHeaderName>(&self, name: K) -> Option<Cow<'_, str>> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
    }

    /// Every header name once, paired with its first value
    pub fn header_pairs(&self) -> Vec<(&str, Cow<'_, str>)> {
        self.headers
            .keys()
            .filter_map(|name| {
                self.headers
                    .get(name)
                    .map(|v| (name.as_str(), String::from_utf8_lossy(v.as_bytes())))
            })
            .collect()
    }
}
