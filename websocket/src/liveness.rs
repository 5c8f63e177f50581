//! Liveness monitor that evicts connections which stop answering pings.
//!
//! Per connection: `Alive → PingSent → (Alive on pong | terminated)`. Every
//! sweep probes each `Alive` connection and marks it `PingSent`; a connection
//! still `PingSent` at the next sweep had a full interval to answer, so it is
//! terminated and removed from the registry.
//!
//! Sweeps run under the registry lock, so a sweep can never interleave with
//! another registry mutation such as a concurrent close.

use std::time::Duration;

use gateway_types::ConnectionId;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::registry::{ConnectionRegistry, Liveness};
use crate::SharedRegistry;

/// Default sweep period.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest accepted sweep period; tokio intervals reject zero.
pub const MIN_PING_INTERVAL: Duration = Duration::from_millis(1);

pub struct LivenessMonitor {
    registry: SharedRegistry,
    interval: Duration,
}

impl LivenessMonitor {
    /// `interval` is raised to [`MIN_PING_INTERVAL`] if shorter.
    pub fn new(registry: SharedRegistry, interval: Duration) -> Self {
        Self {
            registry,
            interval: interval.max(MIN_PING_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one sweep now. Returns the connections that were terminated.
    pub async fn sweep(&self) -> Vec<ConnectionId> {
        let mut registry = self.registry.lock().await;
        sweep_registry(&mut registry)
    }

    /// Sweep every interval until `shutdown` fires. The first sweep happens
    /// one full interval after spawning.
    pub fn spawn(self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let terminated = self.sweep().await;
                        if !terminated.is_empty() {
                            tracing::info!(count = terminated.len(), "reclaimed unresponsive connections");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("liveness monitor stopping");
                        break;
                    }
                }
            }
        })
    }
}

/// One liveness pass over `registry`.
pub fn sweep_registry(registry: &mut ConnectionRegistry) -> Vec<ConnectionId> {
    let mut dead = Vec::new();
    for (id, entry) in registry.entries_mut() {
        match entry.liveness {
            Liveness::PingSent => {
                tracing::info!(connection = %id, "no pong within one interval, terminating");
                entry.transport.terminate();
                dead.push(*id);
            }
            Liveness::Alive => {
                entry.liveness = Liveness::PingSent;
                if entry.transport.ping().is_err() {
                    tracing::debug!(connection = %id, "ping on closed transport, terminating");
                    entry.transport.terminate();
                    dead.push(*id);
                }
            }
        }
    }
    for id in &dead {
        registry.remove_connection(*id);
    }
    dead
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_nullables::NullTransport;
    use gateway_types::{Account, Transport};
    use std::sync::Arc;

    #[test]
    fn silent_connection_is_terminated_on_second_sweep() {
        let mut reg = ConnectionRegistry::new();
        let (transport, record) = NullTransport::new();
        let id = reg.register(Arc::new(transport));
        reg.subscribe(id, [Account::from("A")]);

        assert!(sweep_registry(&mut reg).is_empty());
        assert_eq!(record.pings(), 1);
        assert_eq!(reg.liveness(id), Some(Liveness::PingSent));

        assert_eq!(sweep_registry(&mut reg), vec![id]);
        assert!(record.is_terminated());
        assert!(!reg.contains(id));
        assert_eq!(reg.broadcast(&Account::from("A"), "x"), 0);
        assert_eq!(record.sent_count(), 0);
        assert_eq!(reg.account_count(), 0);
    }

    #[test]
    fn answering_connection_survives() {
        let mut reg = ConnectionRegistry::new();
        let (transport, record) = NullTransport::new();
        let id = reg.register(Arc::new(transport));

        for _ in 0..5 {
            assert!(sweep_registry(&mut reg).is_empty());
            reg.mark_alive(id);
        }
        assert_eq!(record.pings(), 5);
        assert!(!record.is_terminated());
        assert!(reg.contains(id));
    }

    #[test]
    fn already_closed_transport_is_reclaimed_immediately() {
        let mut reg = ConnectionRegistry::new();
        let (transport, record) = NullTransport::new();
        let transport = Arc::new(transport);
        let id = reg.register(transport.clone());
        transport.terminate();

        assert_eq!(sweep_registry(&mut reg), vec![id]);
        assert!(record.is_terminated());
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn zero_interval_is_clamped_and_spawns() {
        let monitor = LivenessMonitor::new(crate::shared_registry(), Duration::ZERO);
        assert_eq!(monitor.interval(), MIN_PING_INTERVAL);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = monitor.spawn(shutdown_rx);
        tokio::time::sleep(Duration::from_millis(5)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn spawned_monitor_reclaims_and_stops_on_shutdown() {
        let registry = crate::shared_registry();
        let (transport, record) = NullTransport::new();
        let id = registry.lock().await.register(Arc::new(transport));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let monitor = LivenessMonitor::new(registry.clone(), Duration::from_millis(20));
        let handle = monitor.spawn(shutdown_rx);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(record.is_terminated());
        assert!(!registry.lock().await.contains(id));

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
