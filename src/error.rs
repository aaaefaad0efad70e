//! Error types for the request pipeline
//!
//! Only genuine faults are represented here. A missing static asset or an
//! unmatched route is normal control flow and never becomes an error.

use hyper::header::InvalidHeaderValue;
use hyper::StatusCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Faults that can escape a pipeline stage
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Host or URL could not be derived from the request
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// I/O failure while resolving or opening a static asset (other than not-found)
    #[error("Failed to read static asset '{}': {source}", path.display())]
    StaticAsset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stage tried to change the response head after it was committed
    #[error("Response headers already sent")]
    HeadersSent,

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Connection-level failure reported by the transport
    #[error("Connection error: {0}")]
    Transport(#[from] hyper::Error),
}

impl PipelineError {
    /// Short machine-readable name used in error log records
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "MalformedRequestError",
            Self::StaticAsset { .. } => "StaticAssetError",
            Self::HeadersSent => "HeadersSentError",
            Self::InvalidHeader(_) => "InvalidHeaderError",
            Self::Serialization(_) => "SerializationError",
            Self::Transport(_) => "TransportError",
        }
    }

    /// Status explicitly attached to this error, if any
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::MalformedRequest(_) => Some(StatusCode::BAD_REQUEST),
            _ => None,
        }
    }
}

/// What the error handler writes back to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignal {
    pub status: StatusCode,
    pub message: String,
}

impl From<&PipelineError> for ErrorSignal {
    fn from(err: &PipelineError) -> Self {
        match err.status() {
            Some(status) => Self {
                status,
                message: err.to_string(),
            },
            // Status-less faults are replaced by a generic 500 so internal
            // details (paths, OS errors) never reach the client.
            None => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: StatusCode::INTERNAL_SERVER_ERROR
                    .canonical_reason()
                    .unwrap_or("Internal Server Error")
                    .to_string(),
            },
        }
    }
}
