//! Request routing dispatch module
//!
//! Exactly two literal routes exist. Everything else is answered by the
//! not-found handler.

use crate::error::PipelineError;
use crate::http::{RequestContext, ResponseWriter};
use crate::logger::{Level, Logger, RouteRecord};
use hyper::{Method, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;

const TEXT_PLAIN: &str = "text/plain";
const APPLICATION_JSON: &str = "application/json";

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

/// Dispatch on `METHOD pathname`
pub fn dispatch(
    ctx: &RequestContext<'_>,
    res: &mut ResponseWriter,
    logger: &Logger,
) -> Result<(), PipelineError> {
    let method = ctx.request().method();
    let route = format!(
        "{} {}",
        method.as_str().to_ascii_uppercase(),
        ctx.pathname()
    );
    if logger.enabled(Level::Debug) {
        logger.record(
            Level::Debug,
            &RouteRecord {
                event: "route",
                route: &route,
                search_params: ctx.search_params(),
            },
        );
    }

    match route.as_str() {
        "GET /" => {
            let body = header_dump(ctx);
            res.write_head(StatusCode::OK, TEXT_PLAIN)?;
            res.end(body);
            Ok(())
        }
        "POST /" => {
            let headers: BTreeMap<&str, String> = ctx
                .request()
                .header_pairs()
                .into_iter()
                .map(|(k, v)| (k, v.into_owned()))
                .collect();
            let body = serde_json::to_string(&headers)?;
            res.write_head(StatusCode::OK, APPLICATION_JSON)?;
            res.end(body);
            Ok(())
        }
        _ => not_found(method, res),
    }
}

/// One `key: value` line per request header
fn header_dump(ctx: &RequestContext<'_>) -> String {
    ctx.request()
        .header_pairs()
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 404 for unknown GET resources, 501 for any other method
pub fn not_found(method: &Method, res: &mut ResponseWriter) -> Result<(), PipelineError> {
    if method == Method::GET {
        let status = StatusCode::NOT_FOUND;
        res.write_head(status, TEXT_PLAIN)?;
        res.end(status.canonical_reason().unwrap_or("Not Found"));
        return Ok(());
    }

    let status = StatusCode::NOT_IMPLEMENTED;
    let body = serde_json::to_string(&ErrorBody {
        message: status.canonical_reason().unwrap_or("Not Implemented"),
    })?;
    res.write_head(status, APPLICATION_JSON)?;
    res.end(body);
    Ok(())
}
