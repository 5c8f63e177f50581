//! Error types shared across crates.

use thiserror::Error;

/// Failure to interpret an inbound payload (client frame or block callback).
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("malformed block: {0}")]
    MalformedBlock(String),
}

/// Failure to hand a frame to a connection's outbound path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection is closed")]
    Closed,
}
