//! Response sink for one exchange
//!
//! Stages write into a [`ResponseWriter`]; the transport receives the finished
//! `Response<TrackedBody>`. The head can be committed exactly once, and a
//! registered finish hook runs exactly once when the body is done or dropped.

use crate::error::PipelineError;
use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Body, Bytes, Frame, SizeHint};
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;

/// Boxed response body, buffered or streamed
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// Callback run once the response is complete
pub type FinishHook = Box<dyn FnOnce(&ResponseSummary) + Send>;

/// Final status and headers, handed to the finish hook
#[derive(Debug, Clone)]
pub struct ResponseSummary {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Mutable response under construction
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<ResponseBody>,
    headers_sent: bool,
    on_finish: Option<FinishHook>,
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("headers_sent", &self.headers_sent)
            .field("has_body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
            headers_sent: false,
            on_finish: None,
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether the head has been committed
    pub const fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Set a header, replacing any previous value
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<(), PipelineError> {
        if self.headers_sent {
            return Err(PipelineError::HeadersSent);
        }
        self.headers.insert(name, value);
        Ok(())
    }

    /// Commit status and content type; no header can change afterwards
    pub fn write_head(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
    ) -> Result<(), PipelineError> {
        if self.headers_sent {
            return Err(PipelineError::HeadersSent);
        }
        self.status = status;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.headers_sent = true;
        Ok(())
    }

    /// Finish with a buffered body
    pub fn end(&mut self, body: impl Into<Bytes>) {
        self.headers_sent = true;
        self.body = Some(
            Full::new(body.into())
                .map_err(|never| match never {})
                .boxed_unsync(),
        );
    }

    /// Finish with a streamed body
    pub fn end_stream(&mut self, body: ResponseBody) {
        self.headers_sent = true;
        self.body = Some(body);
    }

    /// Register the completion callback, replacing any earlier one
    pub fn on_finish(&mut self, hook: FinishHook) {
        self.on_finish = Some(hook);
    }

    /// Hand the response to the transport
    pub fn into_response(self) -> Response<TrackedBody> {
        let body = self.body.unwrap_or_else(|| {
            Empty::<Bytes>::new()
                .map_err(|never| match never {})
                .boxed_unsync()
        });
        let on_finish = self.on_finish.map(|hook| {
            (
                hook,
                ResponseSummary {
                    status: self.status,
                    headers: self.headers.clone(),
                },
            )
        });

        let mut response = Response::new(TrackedBody {
            inner: body,
            on_finish,
        });
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Stream a reader as a chunked body; dropping the body closes the reader
pub fn stream_body<R>(reader: R) -> ResponseBody
where
    R: tokio::io::AsyncRead + Send + 'static,
{
    StreamBody::new(ReaderStream::new(reader).map_ok(Frame::data)).boxed_unsync()
}

/// Body wrapper that fires the finish hook exactly once
pub struct TrackedBody {
    inner: ResponseBody,
    on_finish: Option<(FinishHook, ResponseSummary)>,
}

impl fmt::Debug for TrackedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedBody")
            .field("pending_hook", &self.on_finish.is_some())
            .finish_non_exhaustive()
    }
}

impl TrackedBody {
    fn finish(&mut self) {
        if let Some((hook, summary)) = self.on_finish.take() {
            hook(&summary);
        }
    }
}

impl Body for TrackedBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if matches!(polled, Poll::Ready(None)) {
            this.finish();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_headers_locked_after_write_head() {
        let mut res = ResponseWriter::new();
        res.set_header(HeaderName::from_static("x-a"), HeaderValue::from_static("1"))
            .unwrap();
        res.write_head(StatusCode::NOT_FOUND, "text/plain").unwrap();
        assert!(res.headers_sent());

        let err = res
            .set_header(HeaderName::from_static("x-b"), HeaderValue::from_static("2"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::HeadersSent));
        assert!(matches!(
            res.write_head(StatusCode::OK, "text/plain"),
            Err(PipelineError::HeadersSent)
        ));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_into_response_carries_head_and_body() {
        let mut res = ResponseWriter::new();
        res.write_head(StatusCode::CREATED, "application/json").unwrap();
        res.end("{}");

        let response = res.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"{}");
    }

    #[tokio::test]
    async fn test_finish_hook_fires_once_after_body_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut res = ResponseWriter::new();
        res.on_finish(Box::new(move |summary| {
            assert_eq!(summary.status, StatusCode::OK);
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        res.write_head(StatusCode::OK, "text/plain").unwrap();
        res.end("hello");

        let body = res.into_response().into_body();
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_finish_hook_fires_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut res = ResponseWriter::new();
        res.on_finish(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        res.end("never sent");

        drop(res.into_response());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_body_yields_reader_bytes() {
        let body = stream_body(std::io::Cursor::new(b"chunked bytes".to_vec()));
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"chunked bytes");
    }
}
