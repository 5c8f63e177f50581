//! Periodic gateway statistics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway_utils::{format_duration, WindowCounter};
use gateway_websocket::SharedRegistry;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};

use crate::metrics::GatewayMetrics;

/// One stats window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatsSnapshot {
    pub clients: usize,
    pub accounts: usize,
    pub blocks_per_second: f64,
}

pub struct StatsReporter {
    registry: SharedRegistry,
    blocks: Arc<WindowCounter>,
    metrics: Option<Arc<GatewayMetrics>>,
    interval: Duration,
    started: Instant,
}

impl StatsReporter {
    pub fn new(
        registry: SharedRegistry,
        blocks: Arc<WindowCounter>,
        metrics: Option<Arc<GatewayMetrics>>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            blocks,
            metrics,
            interval,
            started: Instant::now(),
        }
    }

    /// Close the current window: log it, mirror it into metrics, and reset
    /// the block counter.
    pub async fn report(&self) -> StatsSnapshot {
        let (clients, accounts) = {
            let registry = self.registry.lock().await;
            (registry.len(), registry.account_count())
        };
        let snapshot = StatsSnapshot {
            clients,
            accounts,
            blocks_per_second: self.blocks.take_rate(self.interval.as_secs()),
        };

        tracing::info!(
            clients = snapshot.clients,
            accounts = snapshot.accounts,
            tps = snapshot.blocks_per_second,
            uptime = %format_duration(self.started.elapsed().as_secs()),
            "gateway stats"
        );

        if let Some(m) = &self.metrics {
            m.connected_clients.set(snapshot.clients as i64);
            m.subscribed_accounts.set(snapshot.accounts as i64);
            m.blocks_per_second.set(snapshot.blocks_per_second);
        }
        snapshot
    }

    pub fn spawn(self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = interval_at(start, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.report().await;
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("stats reporter stopping");
                        break;
                    }
                }
            }
        })
    }
}
