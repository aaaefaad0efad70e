//! Access logging stage
//!
//! Logs the request immediately and the response once it has finished.

use crate::http::{IncomingRequest, ResponseSummary, ResponseWriter};
use crate::logger::{self, Level, Logger, RequestFinished, RequestLine, RequestStarted};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Emit the start record and register the finish record on the response
pub fn attach(request: &IncomingRequest, res: &mut ResponseWriter, logger: &Logger) {
    let ts = logger::timestamp();
    let request_id = Uuid::new_v4();
    let host = request.host();

    let headers = request
        .header_pairs()
        .into_iter()
        .map(|(k, v)| (k, v.into_owned()))
        .collect();

    logger.record(
        Level::Info,
        &RequestStarted {
            event: "request",
            ts: &ts,
            request_id,
            req: RequestLine {
                remote_ip: request.remote_ip(),
                protocol: request.protocol(),
                host: host.as_deref(),
                method: request.method().as_str(),
                url: request.raw_url(),
            },
            headers,
        },
    );

    let logger = logger.clone();
    res.on_finish(Box::new(move |summary: &ResponseSummary| {
        let headers: BTreeMap<&str, String> = summary
            .headers
            .keys()
            .filter_map(|name| {
                summary
                    .headers
                    .get(name)
                    .map(|v| (name.as_str(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            })
            .collect();
        logger.record(
            Level::Info,
            &RequestFinished {
                event: "response",
                ts: &ts,
                request_id,
                status_code: summary.status.as_u16(),
                status_message: summary.status.canonical_reason().unwrap_or(""),
                headers,
            },
        );
    }));
}
