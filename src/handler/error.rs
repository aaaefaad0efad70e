//! Error handling stage
//!
//! The single place that turns a fault into a client response.

use crate::error::{ErrorSignal, PipelineError};
use crate::http::ResponseWriter;
use crate::logger::{ErrorRecord, Level, Logger};

/// Log the fault and, when possible, answer with a plain-text error
///
/// `res` is `None` for transport failures that happen outside any exchange.
/// A response whose head is already committed is left untouched.
pub fn handle_error(err: &PipelineError, res: Option<&mut ResponseWriter>, logger: &Logger) {
    let signal = ErrorSignal::from(err);
    // Status the client actually receives, if there is a response at all
    let status = res.as_ref().map(|res| {
        if res.headers_sent() {
            res.status()
        } else {
            signal.status
        }
    });
    logger.record(
        Level::Error,
        &ErrorRecord {
            event: "error",
            kind: err.kind(),
            message: err.to_string(),
            status: status.map(|s| s.as_u16()),
        },
    );

    let Some(res) = res else {
        return;
    };

    if res.headers_sent() {
        logger.warn(&format!(
            "Response already committed with status {}, error response skipped",
            res.status().as_u16()
        ));
        return;
    }

    if res.write_head(signal.status, "text/plain").is_ok() {
        res.end(signal.message);
    }
}
