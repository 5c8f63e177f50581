//! Cache over a networked key/value store.
//!
//! Fail-open in both directions: a store error on read is logged and
//! reported as a miss, a store error on write is logged and dropped. The
//! proxy path never sees a cache failure.

use std::time::Duration;

use async_trait::async_trait;
use gateway_store::{CacheBackend, KeyValueStore};

use crate::DEFAULT_EXTERNAL_TTL;

pub struct ExternalKeyValueCache<S> {
    store: S,
    default_ttl: Duration,
}

impl<S: KeyValueStore> ExternalKeyValueCache<S> {
    /// Wrap `store` with the standard 24-hour default ttl.
    pub fn new(store: S) -> Self {
        Self::with_default_ttl(store, DEFAULT_EXTERNAL_TTL)
    }

    pub fn with_default_ttl(store: S, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: KeyValueStore> CacheBackend for ExternalKeyValueCache<S> {
    async fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "external cache read failed, treating as miss");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) {
        // Redis rejects `SET EX 0`; round sub-second ttls up to one second.
        let ttl_secs = ttl.unwrap_or(self.default_ttl).as_secs().max(1);
        if let Err(e) = self.store.set_ex(key, value, ttl_secs).await {
            tracing::warn!(key, error = %e, "external cache write failed, dropping");
        } else {
            tracing::debug!(key, ttl_secs, "cached value");
        }
    }

    fn name(&self) -> &'static str {
        self.store.name()
    }
}
