//! Axum handler for the wallet-facing RPC endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::error::RpcError;
use crate::proxy::RpcProxy;

/// `POST /`: forward an allow-listed action to the node.
///
/// The body is parsed as JSON regardless of the request's content type;
/// some wallets omit the header.
pub async fn rpc_handler(State(proxy): State<Arc<RpcProxy>>, body: Bytes) -> Response {
    let request: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => return RpcError::InvalidRequest(e.to_string()).into_response(),
    };
    match proxy.handle(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}
