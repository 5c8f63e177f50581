//! Redis-backed [`KeyValueStore`].

use async_trait::async_trait;
use gateway_store::{KeyValueStore, StoreError};
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tokio::sync::Mutex;

/// Redis client with a lazily established, auto-reconnecting connection.
///
/// The connection manager is created on first use rather than at startup so
/// an unreachable server only degrades the cache instead of preventing the
/// gateway from starting.
pub struct RedisStore {
    client: Client,
    manager: Mutex<Option<ConnectionManager>>,
}

impl RedisStore {
    /// Parse `url` without connecting.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            manager: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let mut slot = self.manager.lock().await;
        if let Some(manager) = slot.as_ref() {
            return Ok(manager.clone());
        }
        let manager = ConnectionManager::new(self.client.clone())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::info!("redis work cache: connected");
        *slot = Some(manager.clone());
        Ok(manager)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.get(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
