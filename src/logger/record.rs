//! Structured log records
//!
//! A request produces a start record and a finish record. Both carry the
//! timestamp taken when the request started and a per-exchange id, so the
//! pair can be joined even when two requests share a timestamp.

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Emitted when dispatch begins
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStarted<'a> {
    pub event: &'static str,
    pub ts: &'a str,
    pub request_id: Uuid,
    pub req: RequestLine<'a>,
    pub headers: BTreeMap<&'a str, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLine<'a> {
    pub remote_ip: String,
    pub protocol: &'a str,
    /// `None` when the request carried no usable host
    pub host: Option<&'a str>,
    pub method: &'a str,
    pub url: &'a str,
}

/// Emitted once the response has been sent or the connection dropped
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFinished<'a> {
    pub event: &'static str,
    pub ts: &'a str,
    pub request_id: Uuid,
    pub status_code: u16,
    pub status_message: &'a str,
    pub headers: BTreeMap<&'a str, String>,
}

/// Debug record for route dispatch
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord<'a> {
    pub event: &'static str,
    pub route: &'a str,
    pub search_params: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
pub struct ErrorRecord<'a> {
    pub event: &'static str,
    pub kind: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}
