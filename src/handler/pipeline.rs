//! Request pipeline
//!
//! Runs the stages in fixed order for one exchange:
//! headers, context derivation, static assets (may short-circuit), access
//! log, router. A request whose context cannot be derived is still logged.
//! Any fault is caught once and handed to the error handler.

use crate::config::Config;
use crate::error::PipelineError;
use crate::handler::headers::{self, ServerIdentity};
use crate::handler::static_files::StaticAssets;
use crate::handler::{access_log, error, router};
use crate::http::{IncomingRequest, RequestContext, ResponseWriter, TrackedBody};
use crate::logger::Logger;
use hyper::Response;

/// Stateless pipeline; all per-request data lives on the stack of `handle`
#[derive(Debug, Clone)]
pub struct Pipeline {
    assets: StaticAssets,
    identity: ServerIdentity,
    logger: Logger,
}

impl Pipeline {
    pub const fn new(assets: StaticAssets, identity: ServerIdentity, logger: Logger) -> Self {
        Self {
            assets,
            identity,
            logger,
        }
    }

    pub fn from_config(config: &Config, logger: Logger) -> Result<Self, PipelineError> {
        Ok(Self::new(
            StaticAssets::new(&config.assets.root, &config.assets.index_file),
            ServerIdentity::from_config(&config.http)?,
            logger,
        ))
    }

    pub const fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Process one exchange; always yields exactly one response
    pub async fn handle(&self, request: IncomingRequest) -> Response<TrackedBody> {
        let mut res = ResponseWriter::new();
        if let Err(err) = self.run(&request, &mut res).await {
            error::handle_error(&err, Some(&mut res), &self.logger);
        }
        res.into_response()
    }

    async fn run(
        &self,
        request: &IncomingRequest,
        res: &mut ResponseWriter,
    ) -> Result<(), PipelineError> {
        headers::apply(request, &self.identity, res)?;
        let ctx = match RequestContext::derive(request) {
            Ok(ctx) => ctx,
            Err(err) => {
                access_log::attach(request, res, &self.logger);
                return Err(err);
            }
        };
        if self.assets.serve(&ctx, res, &self.logger).await? {
            return Ok(());
        }
        access_log::attach(request, res, &self.logger);
        router::dispatch(&ctx, res, &self.logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::logger::Level;
    use http_body_util::BodyExt;
    use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, ETAG, SERVER};
    use hyper::{HeaderMap, Method, StatusCode, Uri};
    use std::sync::{Arc, Mutex};

    struct Harness {
        pipeline: Pipeline,
        lines: Arc<Mutex<Vec<String>>>,
        _root: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("style.css"), "body {}").unwrap();
        std::fs::create_dir(root.path().join("app")).unwrap();
        std::fs::write(root.path().join("app/index.html"), "<p>app</p>").unwrap();

        let (logger, lines) = Logger::in_memory(Level::Info);
        let identity = ServerIdentity::from_config(&HttpConfig {
            server_name: "acl-ingress-k8s".to_string(),
            backend_host: Some("pod-a".to_string()),
        })
        .unwrap();
        Harness {
            pipeline: Pipeline::new(StaticAssets::new(root.path(), "index.html"), identity, logger),
            lines,
            _root: root,
        }
    }

    fn request(method: Method, uri: &str, headers: &[(&'static str, &'static str)]) -> IncomingRequest {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.append(*k, HeaderValue::from_static(v));
        }
        IncomingRequest::new(
            method,
            uri.parse::<Uri>().unwrap(),
            map,
            "198.51.100.4:52000".parse().unwrap(),
            false,
        )
    }

    async fn send(h: &Harness, req: IncomingRequest) -> (StatusCode, HeaderMap, String) {
        let response = h.pipeline.handle(req).await;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8_lossy(&body).into_owned())
    }

    fn records(h: &Harness, event: &str) -> Vec<serde_json::Value> {
        h.lines
            .lock()
            .unwrap()
            .iter()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .filter(|v| v["event"] == event)
            .collect()
    }

    fn assert_unconditional_headers(headers: &HeaderMap) {
        assert_eq!(headers[ETAG], "false");
        assert!(headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        assert_eq!(headers["access-control-allow-methods"], "GET, POST, HEAD");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert_eq!(headers[SERVER], "acl-ingress-k8s");
        assert_eq!(headers["x-backend-host"], "pod-a");
    }

    #[tokio::test]
    async fn test_get_root_with_origin() {
        let h = harness();
        let req = request(
            Method::GET,
            "/",
            &[("host", "ingress.test"), ("origin", "https://example.com")],
        );
        let (status, headers, body) = send(&h, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_unconditional_headers(&headers);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert_eq!(body.lines().count(), 2);
        assert!(body.lines().any(|l| l == "origin: https://example.com"));
    }

    #[tokio::test]
    async fn test_static_hit_short_circuits() {
        let h = harness();
        let req = request(Method::GET, "/style.css", &[("host", "ingress.test")]);
        let (status, headers, body) = send(&h, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_unconditional_headers(&headers);
        assert_eq!(headers[CONTENT_TYPE], "text/css");
        assert_eq!(body, "body {}");
        // Served before the logging stage runs
        assert!(records(&h, "request").is_empty());
    }

    #[tokio::test]
    async fn test_directory_index() {
        let h = harness();
        let req = request(Method::GET, "/app/", &[("host", "ingress.test")]);
        let (status, headers, body) = send(&h, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/html");
        assert_eq!(body, "<p>app</p>");
    }

    #[tokio::test]
    async fn test_missing_asset_is_404() {
        let h = harness();
        let req = request(Method::GET, "/missing.file", &[("host", "ingress.test")]);
        let (status, headers, body) = send(&h, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_unconditional_headers(&headers);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn test_put_root_is_501() {
        let h = harness();
        let req = request(Method::PUT, "/", &[("host", "ingress.test")]);
        let (status, headers, body) = send(&h, req).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(body, r#"{"message":"Not Implemented"}"#);
    }

    #[tokio::test]
    async fn test_post_root_echoes_headers() {
        let h = harness();
        let req = request(
            Method::POST,
            "/",
            &[("host", "ingress.test"), ("content-type", "application/json")],
        );
        let (status, _, body) = send(&h, req).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let mut keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["content-type", "host"]);
    }

    #[tokio::test]
    async fn test_traversal_falls_through_to_router() {
        let h = harness();
        let req = request(Method::GET, "/../../etc/passwd", &[("host", "ingress.test")]);
        let (status, _, body) = send(&h, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn test_one_start_and_one_finish_record() {
        let h = harness();
        let req = request(Method::DELETE, "/thing?x=1", &[("host", "ingress.test")]);
        let (status, _, _) = send(&h, req).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

        let starts = records(&h, "request");
        let finishes = records(&h, "response");
        assert_eq!(starts.len(), 1);
        assert_eq!(finishes.len(), 1);
        assert_eq!(starts[0]["ts"], finishes[0]["ts"]);
        assert_eq!(starts[0]["req"]["url"], "/thing?x=1");
        assert_eq!(finishes[0]["statusCode"], 501);
    }

    #[tokio::test]
    async fn test_missing_host_goes_through_error_handler() {
        let h = harness();
        let req = request(Method::GET, "/", &[("origin", "https://example.com")]);
        let (status, headers, body) = send(&h, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_unconditional_headers(&headers);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert_eq!(body, "Malformed request: missing host header");
        assert_eq!(records(&h, "error").len(), 1);

        let starts = records(&h, "request");
        let finishes = records(&h, "response");
        assert_eq!(starts.len(), 1);
        assert_eq!(finishes.len(), 1);
        assert_eq!(starts[0]["requestId"], finishes[0]["requestId"]);
        assert_eq!(finishes[0]["statusCode"], 400);
        assert_eq!(finishes[0]["headers"]["x-backend-host"], "pod-a");
    }

    #[tokio::test]
    async fn test_invalid_host_keeps_unconditional_headers() {
        let h = harness();
        let req = request(Method::GET, "/", &[("host", "evil.test/other")]);
        let (status, headers, _) = send(&h, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_unconditional_headers(&headers);
        assert_eq!(records(&h, "request").len(), 1);
        assert_eq!(records(&h, "response").len(), 1);
    }

    #[tokio::test]
    async fn test_static_io_error_is_500() {
        let h = harness();
        let long = format!("/{}", "x".repeat(300));
        let req = request(Method::GET, &long, &[("host", "ingress.test")]);
        let (status, headers, body) = send(&h, req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_unconditional_headers(&headers);
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert_eq!(body, "Internal Server Error");

        let errors = records(&h, "error");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["kind"], "StaticAssetError");
        assert_eq!(errors[0]["status"], 500);
    }
}
