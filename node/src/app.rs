//! HTTP surface: shared state, the block callback, and route assembly.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRef, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use gateway_rpc::{rpc_handler, RpcProxy};
use gateway_store::TimestampStore;
use gateway_types::{BlockEvent, Timestamp};
use gateway_utils::WindowCounter;
use gateway_websocket::{ws_handler, NotificationRouter, SharedRegistry};
use tower_http::cors::CorsLayer;

use crate::metrics::GatewayMetrics;

/// Everything a request handler may touch.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: SharedRegistry,
    pub notifier: Arc<NotificationRouter>,
    pub proxy: Arc<RpcProxy>,
    pub timestamps: Arc<dyn TimestampStore>,
    /// Block callbacks in the current stats window.
    pub blocks: Arc<WindowCounter>,
    pub metrics: Option<Arc<GatewayMetrics>>,
}

impl GatewayState {
    pub fn new(
        registry: SharedRegistry,
        proxy: Arc<RpcProxy>,
        timestamps: Arc<dyn TimestampStore>,
        metrics: Option<Arc<GatewayMetrics>>,
    ) -> Self {
        Self {
            notifier: Arc::new(NotificationRouter::new(registry.clone())),
            registry,
            proxy,
            timestamps,
            blocks: Arc::new(WindowCounter::new()),
            metrics,
        }
    }

    /// Process one block callback body. Returns the number of frames
    /// enqueued to subscribers.
    pub async fn ingest(&self, body: &[u8]) -> usize {
        self.blocks.increment();
        if let Some(m) = &self.metrics {
            m.blocks_received.inc();
        }

        let event = match std::str::from_utf8(body)
            .map_err(|e| e.to_string())
            .and_then(|text| BlockEvent::from_callback_str(text).map_err(|e| e.to_string()))
        {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "malformed block callback, ignoring");
                if let Some(m) = &self.metrics {
                    m.blocks_malformed.inc();
                }
                return 0;
            }
        };

        match self
            .timestamps
            .save_hash_timestamp(&event.hash, Timestamp::now())
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::debug!(hash = %event.hash, "block already timestamped"),
            Err(e) => tracing::warn!(hash = %event.hash, error = %e, "failed to record block timestamp"),
        }

        let sent = self.notifier.route(&event).await;
        if let Some(m) = &self.metrics {
            m.notifications_sent.inc_by(sent as u64);
        }
        sent
    }
}

impl FromRef<GatewayState> for SharedRegistry {
    fn from_ref(state: &GatewayState) -> Self {
        state.registry.clone()
    }
}

impl FromRef<GatewayState> for Arc<RpcProxy> {
    fn from_ref(state: &GatewayState) -> Self {
        state.proxy.clone()
    }
}

/// `POST /new-block`: the node's block callback. Always answers 200, even
/// for bodies that cannot be parsed.
pub async fn new_block_handler(State(state): State<GatewayState>, body: Bytes) -> StatusCode {
    state.ingest(&body).await;
    StatusCode::OK
}

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// `GET /metrics`: Prometheus text exposition, or 404 when disabled.
pub async fn metrics_handler(State(state): State<GatewayState>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Assemble every route behind a permissive CORS layer.
///
/// `GET /` upgrades to a notification websocket and needs the peer address,
/// so the router must be served with connect info.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(ws_handler).post(rpc_handler))
        .route("/new-block", post(new_block_handler))
        .route("/health-check", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
