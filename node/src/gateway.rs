//! Gateway orchestrator: wires the cache, stores, registry, and proxy
//! together, then runs the HTTP server alongside the background loops.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use gateway_cache::build_backend;
use gateway_rpc::RpcProxy;
use gateway_store::{MemoryTimestampStore, TimestampStore};
use gateway_websocket::{shared_registry, LivenessMonitor};
use tokio::net::TcpListener;

use crate::app::{build_router, GatewayState};
use crate::config::GatewayConfig;
use crate::metrics::GatewayMetrics;
use crate::shutdown::ShutdownController;
use crate::stats::StatsReporter;
use crate::GatewayError;

pub struct Gateway {
    config: GatewayConfig,
    state: GatewayState,
    shutdown: ShutdownController,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let cache = build_backend(&config.cache_settings())?;
        let timestamps: Arc<dyn TimestampStore> =
            Arc::new(MemoryTimestampStore::new(config.timestamp_capacity));
        let proxy = Arc::new(RpcProxy::new(
            config.proxy_config(),
            cache,
            timestamps.clone(),
        )?);
        let metrics = if config.enable_metrics {
            Some(Arc::new(GatewayMetrics::new()?))
        } else {
            None
        };
        let state = GatewayState::new(shared_registry(), proxy, timestamps, metrics);

        Ok(Self {
            config,
            state,
            shutdown: ShutdownController::new(),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Handle for triggering shutdown from outside (signals, tests).
    pub fn shutdown_controller(&self) -> ShutdownController {
        self.shutdown.clone()
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the configured port on all interfaces and serve until shutdown.
    pub async fn run(self) -> Result<(), GatewayError> {
        let listener = TcpListener::bind(("0.0.0.0", self.config.listen_port)).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown is triggered.
    pub async fn serve(self, listener: TcpListener) -> Result<(), GatewayError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            %addr,
            node = %self.config.node_url,
            work_node = %self.config.work_node_url,
            redis = self.config.use_redis,
            "wallet gateway listening"
        );

        let liveness = LivenessMonitor::new(self.state.registry.clone(), self.config.ping_interval())
            .spawn(self.shutdown.subscribe());
        let stats = StatsReporter::new(
            self.state.registry.clone(),
            self.state.blocks.clone(),
            self.state.metrics.clone(),
            self.config.stats_interval(),
        )
        .spawn(self.shutdown.subscribe());

        let server_shutdown = self.shutdown.clone();
        let app = self.router();
        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { server_shutdown.wait().await })
        .await;

        // Stop the loops even when the server ended on its own.
        self.shutdown.shutdown();
        let _ = liveness.await;
        let _ = stats.await;

        let closed = self.state.registry.lock().await.terminate_all();
        tracing::info!(closed, "notification connections closed");

        served.map_err(|e| GatewayError::Server(e.to_string()))
    }
}
