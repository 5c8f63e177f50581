//! Result cache for expensive upstream computations.
//!
//! Two interchangeable [`CacheBackend`] implementations:
//! - [`BoundedMemoryCache`]: fixed-capacity, insertion-ordered, in-process.
//! - [`ExternalKeyValueCache`]: any [`gateway_store::KeyValueStore`]
//!   (Redis in production via [`RedisStore`]), fail-open with default expiry.
//!
//! [`build_backend`] picks one at startup from [`CacheSettings`].

pub mod external;
pub mod keys;
pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

pub use external::ExternalKeyValueCache;
pub use gateway_store::CacheBackend;
pub use keys::{ONLINE_REPRESENTATIVES_KEY, REPRESENTATIVES_TTL};
pub use memory::BoundedMemoryCache;
pub use redis_store::RedisStore;

/// Default number of entries kept by [`BoundedMemoryCache`].
pub const DEFAULT_MEMORY_CAPACITY: usize = 800;

/// Default retention for [`ExternalKeyValueCache`] writes without a ttl.
pub const DEFAULT_EXTERNAL_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Which backend to build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheSettings {
    Memory { capacity: usize },
    Redis { url: String, default_ttl: Duration },
}

/// Construct the process-wide cache backend.
///
/// Building the Redis variant never fails on an unreachable server: the
/// connection is established lazily and the cache degrades to misses until
/// it comes up. Only a malformed URL is rejected.
pub fn build_backend(
    settings: &CacheSettings,
) -> Result<Arc<dyn CacheBackend>, gateway_store::StoreError> {
    match settings {
        CacheSettings::Memory { capacity } => {
            tracing::info!(capacity, "using in-memory work cache");
            Ok(Arc::new(BoundedMemoryCache::new(*capacity)))
        }
        CacheSettings::Redis { url, default_ttl } => {
            tracing::info!(url = %url, "using redis work cache");
            let store = RedisStore::open(url)?;
            Ok(Arc::new(ExternalKeyValueCache::with_default_ttl(
                store,
                *default_ttl,
            )))
        }
    }
}
