//! Wallet gateway daemon.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gateway_node::{init_logging, Gateway, GatewayConfig};

/// Every flag is optional: set values override the `--config` file, which
/// overrides built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "wallet-gateway", about = "QLC wallet notification and RPC gateway")]
struct Cli {
    /// Port serving HTTP, RPC, and websocket upgrades.
    #[arg(long, env = "GATEWAY_APP_PORT")]
    port: Option<u16>,

    /// Upstream node RPC URL.
    #[arg(long, env = "GATEWAY_NODE_URL")]
    node_url: Option<String>,

    /// Upstream node used for `work_generate` (defaults to the node URL).
    #[arg(long, env = "GATEWAY_WORK_NODE_URL")]
    work_node_url: Option<String>,

    /// Cache work and representatives in Redis instead of memory.
    #[arg(long, env = "GATEWAY_USE_REDIS")]
    use_redis: Option<bool>,

    #[arg(long, env = "GATEWAY_REDIS_URL")]
    redis_url: Option<String>,

    /// Serve Prometheus metrics on `/metrics`.
    #[arg(long, env = "GATEWAY_ENABLE_METRICS")]
    metrics: Option<bool>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GATEWAY_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GATEWAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Fill unset values from the variable names used by existing
    /// deployments: `APP_PORT`, `QLC_NODE_URL`, `QLC_WORK_NODE_URL`,
    /// `USE_REDIS`, `REDIS_HOST`. `GATEWAY_*` variables and flags win.
    fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if self.port.is_none() {
            if let Some(port) = var("APP_PORT") {
                self.port = Some(port.parse().with_context(|| format!("APP_PORT={port}"))?);
            }
        }
        if self.node_url.is_none() {
            self.node_url = var("QLC_NODE_URL");
        }
        if self.work_node_url.is_none() {
            self.work_node_url = var("QLC_WORK_NODE_URL");
        }
        if self.use_redis.is_none() {
            self.use_redis = var("USE_REDIS").map(|v| !matches!(v.as_str(), "false" | "0"));
        }
        if self.redis_url.is_none() {
            // REDIS_HOST carries a bare host name.
            self.redis_url = var("REDIS_HOST").map(|host| {
                if host.contains("://") {
                    host
                } else {
                    format!("redis://{host}")
                }
            });
        }
        Ok(())
    }

    fn into_config(self) -> anyhow::Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GatewayConfig::default(),
        };

        if let Some(port) = self.port {
            config.listen_port = port;
        }
        if let Some(url) = self.node_url {
            // A lone node URL also carries work unless told otherwise.
            if self.work_node_url.is_none() && config.work_node_url == config.node_url {
                config.work_node_url = url.clone();
            }
            config.node_url = url;
        }
        if let Some(url) = self.work_node_url {
            config.work_node_url = url;
        }
        if let Some(use_redis) = self.use_redis {
            config.use_redis = use_redis;
        }
        if let Some(url) = self.redis_url {
            config.redis_url = url;
        }
        if let Some(metrics) = self.metrics {
            config.enable_metrics = metrics;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    cli.apply_legacy_env(|name| std::env::var(name).ok())?;
    let config = cli.into_config()?;
    init_logging(config.log_format()?, &config.log_level)?;

    let gateway = Gateway::new(config)?;
    let controller = gateway.shutdown_controller();
    tokio::spawn(async move { controller.wait_for_signal().await });

    gateway.run().await?;
    tracing::info!("wallet gateway exited cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "wallet-gateway",
            "--port",
            "9000",
            "--node-url",
            "http://node:7076",
            "--use-redis",
            "true",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.listen_port, 9000);
        assert_eq!(config.node_url, "http://node:7076");
        assert_eq!(config.work_node_url, "http://node:7076");
        assert!(config.use_redis);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn separate_work_node_is_kept() {
        let cli = Cli::parse_from([
            "wallet-gateway",
            "--node-url",
            "http://node:7076",
            "--work-node-url",
            "http://work:7076",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.work_node_url, "http://work:7076");
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn legacy_variables_fill_unset_values() {
        let mut cli = Cli::parse_from(["wallet-gateway"]);
        cli.apply_legacy_env(env(&[
            ("APP_PORT", "8080"),
            ("QLC_NODE_URL", "http://node:29735"),
            ("QLC_WORK_NODE_URL", "http://work:29735"),
            ("USE_REDIS", "1"),
            ("REDIS_HOST", "cache"),
        ]))
        .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.node_url, "http://node:29735");
        assert_eq!(config.work_node_url, "http://work:29735");
        assert!(config.use_redis);
        assert_eq!(config.redis_url, "redis://cache");
    }

    #[test]
    fn flags_take_precedence_over_legacy_variables() {
        let mut cli = Cli::parse_from(["wallet-gateway", "--port", "9000"]);
        cli.apply_legacy_env(env(&[("APP_PORT", "8080"), ("USE_REDIS", "false")]))
            .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.listen_port, 9000);
        assert!(!config.use_redis);
    }

    #[test]
    fn malformed_legacy_port_is_an_error() {
        let mut cli = Cli::parse_from(["wallet-gateway"]);
        assert!(cli.apply_legacy_env(env(&[("APP_PORT", "eighty")])).is_err());
    }
}
