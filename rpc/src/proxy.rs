//! Upstream forwarding with result caching.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway_cache::{CacheBackend, ONLINE_REPRESENTATIVES_KEY, REPRESENTATIVES_TTL};
use gateway_store::TimestampStore;
use gateway_types::BlockHash;
use serde_json::Value;

use crate::allow_list::is_allowed;
use crate::error::RpcError;
use crate::timestamps;

/// Where and how to reach the upstream node.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// General RPC endpoint.
    pub node_url: String,
    /// Endpoint for `work_generate` (may be a dedicated work peer).
    pub work_node_url: String,
    /// Per-request upstream timeout. Work generation can be slow.
    pub timeout: Duration,
    /// Retention of the cached representative list.
    pub representatives_ttl: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            node_url: "http://qlc_node:29735".to_string(),
            work_node_url: "http://qlc_node:29735".to_string(),
            timeout: Duration::from_secs(200),
            representatives_ttl: REPRESENTATIVES_TTL,
        }
    }
}

/// What the cache can do for a request, decided before forwarding.
enum CachePlan {
    None,
    Work(String),
    Representatives,
}

pub struct RpcProxy {
    http: reqwest::Client,
    config: ProxyConfig,
    cache: Arc<dyn CacheBackend>,
    timestamps: Arc<dyn TimestampStore>,
}

impl RpcProxy {
    pub fn new(
        config: ProxyConfig,
        cache: Arc<dyn CacheBackend>,
        timestamps: Arc<dyn TimestampStore>,
    ) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::Client(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            cache,
            timestamps,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Handle one wallet RPC request body.
    pub async fn handle(&self, request: Value) -> Result<Value, RpcError> {
        let action = match request.get("action") {
            Some(Value::String(a)) => a.clone(),
            Some(other) => other.to_string(),
            None => "undefined".to_string(),
        };
        if !is_allowed(&action) {
            return Err(RpcError::ActionNotAllowed(action));
        }

        let plan = match action.as_str() {
            "work_generate" => {
                let hash = request
                    .get("hash")
                    .and_then(Value::as_str)
                    .filter(|h| !h.is_empty())
                    .ok_or(RpcError::MissingHash)?;
                if let Some(work) = self.cached(hash).await {
                    tracing::debug!(hash, "work cache hit");
                    return Ok(serde_json::json!({ "work": work }));
                }
                CachePlan::Work(hash.to_string())
            }
            "representatives_online" => {
                if let Some(cached) = self.cached(ONLINE_REPRESENTATIVES_KEY).await {
                    match serde_json::from_str::<Value>(&cached) {
                        Ok(value) => return Ok(value),
                        Err(e) => tracing::warn!(error = %e, "discarding corrupt representative cache entry"),
                    }
                }
                CachePlan::Representatives
            }
            _ => CachePlan::None,
        };

        let url = match &plan {
            CachePlan::Work(_) => &self.config.work_node_url,
            _ => &self.config.node_url,
        };

        let started = Instant::now();
        let result = self.forward(url, &request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let response = match result {
            Ok(response) => {
                tracing::debug!(action = %action, elapsed_ms, "upstream call");
                response
            }
            Err(e) => {
                tracing::error!(action = %action, elapsed_ms, error = %e, "upstream call failed");
                return Err(e);
            }
        };

        self.populate_cache(&plan, &response).await;
        Ok(self.augment(&action, &request, response).await)
    }

    async fn cached(&self, key: &str) -> Option<String> {
        self.cache.get(key).await.filter(|v| !v.is_empty())
    }

    async fn forward(&self, url: &str, body: &Value) -> Result<Value, RpcError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::Upstream(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RpcError::Upstream(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RpcError::Upstream(format!("invalid JSON response: {e}")))
    }

    async fn populate_cache(&self, plan: &CachePlan, response: &Value) {
        match plan {
            CachePlan::Work(hash) => {
                if let Some(work) = response.get("work").and_then(Value::as_str) {
                    if !work.is_empty() {
                        self.cache.put(hash, work, None).await;
                    }
                }
            }
            CachePlan::Representatives => {
                if response.get("representatives").is_some() {
                    self.cache
                        .put(
                            ONLINE_REPRESENTATIVES_KEY,
                            &response.to_string(),
                            Some(self.config.representatives_ttl),
                        )
                        .await;
                }
            }
            CachePlan::None => {}
        }
    }

    async fn augment(&self, action: &str, request: &Value, response: Value) -> Value {
        let store = self.timestamps.as_ref();
        match action {
            "account_history" => timestamps::map_account_history(store, response).await,
            "blocks_info" => {
                let requested: Vec<BlockHash> = request
                    .get("hashes")
                    .and_then(Value::as_array)
                    .map(|hs| {
                        hs.iter()
                            .filter_map(Value::as_str)
                            .map(BlockHash::from)
                            .collect()
                    })
                    .unwrap_or_default();
                timestamps::map_blocks_info(store, &requested, response).await
            }
            "pending" => timestamps::map_pending(store, response).await,
            _ => response,
        }
    }
}
