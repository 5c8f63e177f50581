//! Prometheus metrics for the gateway.
//!
//! [`GatewayMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Gauge,
    IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

pub struct GatewayMetrics {
    pub registry: Registry,

    /// Block callbacks accepted on `/new-block`.
    pub blocks_received: IntCounter,
    /// Callback bodies that could not be parsed.
    pub blocks_malformed: IntCounter,
    /// Notification frames enqueued to subscribers.
    pub notifications_sent: IntCounter,

    pub connected_clients: IntGauge,
    pub subscribed_accounts: IntGauge,
    /// Blocks per second over the last stats window.
    pub blocks_per_second: Gauge,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let blocks_received = register_int_counter_with_registry!(
            Opts::new(
                "gateway_blocks_received_total",
                "Total block callbacks received from the node"
            ),
            registry
        )?;

        let blocks_malformed = register_int_counter_with_registry!(
            Opts::new(
                "gateway_blocks_malformed_total",
                "Total block callbacks with an unparsable body"
            ),
            registry
        )?;

        let notifications_sent = register_int_counter_with_registry!(
            Opts::new(
                "gateway_notifications_sent_total",
                "Total notification frames sent to wallet clients"
            ),
            registry
        )?;

        let connected_clients = register_int_gauge_with_registry!(
            Opts::new(
                "gateway_connected_clients",
                "Current number of websocket connections"
            ),
            registry
        )?;

        let subscribed_accounts = register_int_gauge_with_registry!(
            Opts::new(
                "gateway_subscribed_accounts",
                "Current number of accounts with at least one subscriber"
            ),
            registry
        )?;

        let blocks_per_second = Gauge::with_opts(Opts::new(
            "gateway_blocks_per_second",
            "Average blocks per second over the last stats window",
        ))?;
        registry.register(Box::new(blocks_per_second.clone()))?;

        Ok(Self {
            registry,
            blocks_received,
            blocks_malformed,
            notifications_sent,
            connected_clients,
            subscribed_accounts,
            blocks_per_second,
        })
    }

    /// Encode every registered metric in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_registered_metrics() {
        let metrics = GatewayMetrics::new().unwrap();
        metrics.blocks_received.inc();
        metrics.connected_clients.set(3);
        metrics.blocks_per_second.set(2.5);
        let text = metrics.render().unwrap();
        assert!(text.contains("gateway_blocks_received_total 1"));
        assert!(text.contains("gateway_connected_clients 3"));
        assert!(text.contains("gateway_blocks_per_second 2.5"));
    }

    #[test]
    fn independent_instances_do_not_collide() {
        let a = GatewayMetrics::new().unwrap();
        let b = GatewayMetrics::new().unwrap();
        a.notifications_sent.inc_by(4);
        assert_eq!(b.notifications_sent.get(), 0);
    }
}
