//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Action {0} not allowed")]
    ActionNotAllowed(String),

    #[error("Requires valid hash to perform work")]
    MissingHash,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("http client error: {0}")]
    Client(String),
}

/// Every failure is reported as HTTP 500 with `{"error": "<message>"}`,
/// the envelope wallets already understand.
impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
