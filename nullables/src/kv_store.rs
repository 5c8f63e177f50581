//! Nullable key/value store: an in-memory Redis stand-in with expiry
//! evaluated against a [`NullClock`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gateway_store::{KeyValueStore, StoreError};
use gateway_types::Timestamp;

use crate::NullClock;

struct StoredValue {
    value: String,
    ttl_secs: u64,
    expires_at: Timestamp,
}

/// In-memory key/value store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullKeyValueStore {
    clock: Arc<NullClock>,
    entries: Mutex<HashMap<String, StoredValue>>,
    unavailable: AtomicBool,
}

impl NullKeyValueStore {
    pub fn new(clock: Arc<NullClock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate the server going away (`true`) or coming back (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The ttl the most recent write of `key` was stored with.
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        self.entries.lock().unwrap().get(key).map(|e| e.ttl_secs)
    }

    /// Number of stored keys, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("null store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for NullKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if !entry.expires_at.has_passed(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.check_available()?;
        let expires_at = self.clock.now().plus_secs(ttl_secs);
        self.entries.lock().unwrap().insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                ttl_secs,
                expires_at,
            },
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
