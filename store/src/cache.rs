//! Result cache capability consulted by the RPC proxy.

use std::time::Duration;

use async_trait::async_trait;

/// Uniform key/value cache with optional per-entry expiry.
///
/// The cache is advisory: a miss only means the caller recomputes upstream.
/// Implementations therefore never surface errors. A failing backend reads as
/// a miss and drops writes, logging the cause itself.
///
/// One implementation is chosen at startup and used for the whole process.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up `key`. `None` on miss, expiry, or backend failure.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`. `ttl` of `None` means the backend's default
    /// retention policy.
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>);

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
