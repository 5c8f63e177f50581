//! Gateway configuration with TOML file support.

use std::time::Duration;

use gateway_cache::CacheSettings;
use gateway_rpc::ProxyConfig;
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;
use crate::GatewayError;

/// Configuration for the wallet gateway.
///
/// Can be loaded from a TOML file via [`GatewayConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Port serving HTTP, RPC, and websocket upgrades.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Upstream node for general RPC.
    #[serde(default = "default_node_url")]
    pub node_url: String,

    /// Upstream node for `work_generate`.
    #[serde(default = "default_node_url")]
    pub work_node_url: String,

    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// Use Redis instead of the in-process cache.
    #[serde(default)]
    pub use_redis: bool,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_memory_cache_capacity")]
    pub memory_cache_capacity: usize,

    /// Retention of cached work values in Redis.
    #[serde(default = "default_work_cache_ttl")]
    pub work_cache_ttl_secs: u64,

    #[serde(default = "default_representatives_ttl")]
    pub representatives_ttl_secs: u64,

    /// Block hashes whose first-seen time is retained.
    #[serde(default = "default_timestamp_capacity")]
    pub timestamp_capacity: usize,

    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,

    /// Whether to serve Prometheus metrics on `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8888
}

fn default_node_url() -> String {
    "http://qlc_node:29735".to_string()
}

fn default_upstream_timeout() -> u64 {
    200
}

fn default_redis_url() -> String {
    "redis://redis".to_string()
}

fn default_memory_cache_capacity() -> usize {
    gateway_cache::DEFAULT_MEMORY_CAPACITY
}

fn default_work_cache_ttl() -> u64 {
    gateway_cache::DEFAULT_EXTERNAL_TTL.as_secs()
}

fn default_representatives_ttl() -> u64 {
    gateway_cache::REPRESENTATIVES_TTL.as_secs()
}

fn default_timestamp_capacity() -> usize {
    100_000
}

fn default_ping_interval() -> u64 {
    30
}

fn default_stats_interval() -> u64 {
    10
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, GatewayError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GatewayError> {
        toml::from_str(s).map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, GatewayError> {
        toml::to_string_pretty(self).map_err(|e| GatewayError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, GatewayError> {
        self.log_format.parse()
    }

    pub fn cache_settings(&self) -> CacheSettings {
        if self.use_redis {
            CacheSettings::Redis {
                url: self.redis_url.clone(),
                default_ttl: Duration::from_secs(self.work_cache_ttl_secs),
            }
        } else {
            CacheSettings::Memory {
                capacity: self.memory_cache_capacity,
            }
        }
    }

    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            node_url: self.node_url.clone(),
            work_node_url: self.work_node_url.clone(),
            timeout: Duration::from_secs(self.upstream_timeout_secs),
            representatives_ttl: Duration::from_secs(self.representatives_ttl_secs),
        }
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs.max(1))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            node_url: default_node_url(),
            work_node_url: default_node_url(),
            upstream_timeout_secs: default_upstream_timeout(),
            use_redis: false,
            redis_url: default_redis_url(),
            memory_cache_capacity: default_memory_cache_capacity(),
            work_cache_ttl_secs: default_work_cache_ttl(),
            representatives_ttl_secs: default_representatives_ttl(),
            timestamp_capacity: default_timestamp_capacity(),
            ping_interval_secs: default_ping_interval(),
            stats_interval_secs: default_stats_interval(),
            enable_metrics: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = GatewayConfig {
            use_redis: true,
            listen_port: 9000,
            ..Default::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = GatewayConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.listen_port, 9000);
        assert!(parsed.use_redis);
        assert_eq!(parsed.redis_url, "redis://redis");
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = GatewayConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.listen_port, 8888);
        assert_eq!(config.node_url, "http://qlc_node:29735");
        assert_eq!(config.work_node_url, config.node_url);
        assert_eq!(config.memory_cache_capacity, 800);
        assert_eq!(config.work_cache_ttl_secs, 86_400);
        assert_eq!(config.representatives_ttl_secs, 300);
        assert_eq!(config.ping_interval_secs, 30);
        assert_eq!(config.log_format().unwrap(), LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            work_node_url = "http://work:7076"
            use_redis = true
            work_cache_ttl_secs = 60
        "#;
        let config = GatewayConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.work_node_url, "http://work:7076");
        assert_eq!(config.node_url, "http://qlc_node:29735");
        assert_eq!(
            config.cache_settings(),
            CacheSettings::Redis {
                url: "redis://redis".to_string(),
                default_ttl: Duration::from_secs(60),
            }
        );
        assert_eq!(config.proxy_config().work_node_url, "http://work:7076");
    }

    #[test]
    fn memory_cache_is_the_default_backend() {
        assert_eq!(
            GatewayConfig::default().cache_settings(),
            CacheSettings::Memory { capacity: 800 }
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_port = 7000\nlog_format = \"json\"").unwrap();
        let config = GatewayConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.listen_port, 7000);
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let err = GatewayConfig::from_toml_file("/nonexistent/gateway.toml").unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let config = GatewayConfig::from_toml_str("log_format = \"xml\"").unwrap();
        assert!(matches!(config.log_format(), Err(GatewayError::Config(_))));
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let config = GatewayConfig::from_toml_str("ping_interval_secs = 0").unwrap();
        assert_eq!(config.ping_interval(), Duration::from_secs(1));
    }
}
