//! Networked key/value store underneath the external cache.

use async_trait::async_trait;

use crate::StoreError;

/// Minimal string key/value store with server-side expiry (Redis `GET` /
/// `SET EX` semantics). Unlike [`crate::CacheBackend`], failures are reported
/// so the caching layer can decide how to degrade.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value`, expiring after `ttl_secs` seconds.
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
