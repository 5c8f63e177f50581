//! First-seen timestamps for block hashes.
//!
//! The upstream node does not report when a block arrived, so the gateway
//! records the time it first saw each hash via the block callback and splices
//! it into history/pending/blocks_info responses.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use gateway_types::{BlockHash, Timestamp};

use crate::StoreError;

#[async_trait]
pub trait TimestampStore: Send + Sync {
    /// Record `at` as the first-seen time of `hash`. An existing record is
    /// never overwritten. Returns `true` if a new record was written.
    async fn save_hash_timestamp(&self, hash: &BlockHash, at: Timestamp)
        -> Result<bool, StoreError>;

    /// Look up many hashes at once. Every requested hash appears in the
    /// result, mapped to `None` when unknown.
    async fn get_timestamps(
        &self,
        hashes: &[BlockHash],
    ) -> Result<HashMap<BlockHash, Option<Timestamp>>, StoreError>;
}

/// Process-local timestamp table, bounded to `capacity` hashes with FIFO
/// eviction of the oldest record.
pub struct MemoryTimestampStore {
    inner: Mutex<TimestampTable>,
    capacity: usize,
}

#[derive(Default)]
struct TimestampTable {
    times: HashMap<BlockHash, Timestamp>,
    order: VecDeque<BlockHash>,
}

impl MemoryTimestampStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(TimestampTable::default()),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|t| t.times.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TimestampStore for MemoryTimestampStore {
    async fn save_hash_timestamp(
        &self,
        hash: &BlockHash,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        if self.capacity == 0 {
            return Ok(false);
        }
        let mut table = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("timestamp table lock poisoned".into()))?;
        if table.times.contains_key(hash) {
            tracing::debug!(hash = %hash, "timestamp already recorded, ignoring");
            return Ok(false);
        }
        if table.order.len() >= self.capacity {
            if let Some(evicted) = table.order.pop_front() {
                table.times.remove(&evicted);
            }
        }
        table.times.insert(hash.clone(), at);
        table.order.push_back(hash.clone());
        Ok(true)
    }

    async fn get_timestamps(
        &self,
        hashes: &[BlockHash],
    ) -> Result<HashMap<BlockHash, Option<Timestamp>>, StoreError> {
        let table = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("timestamp table lock poisoned".into()))?;
        Ok(hashes
            .iter()
            .map(|h| (h.clone(), table.times.get(h).copied()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_seen_time_is_kept() {
        let store = MemoryTimestampStore::new(10);
        let hash = BlockHash::from("AA");
        assert!(store
            .save_hash_timestamp(&hash, Timestamp::new(100))
            .await
            .unwrap());
        assert!(!store
            .save_hash_timestamp(&hash, Timestamp::new(200))
            .await
            .unwrap());

        let times = store
            .get_timestamps(&[hash.clone(), BlockHash::from("BB")])
            .await
            .unwrap();
        assert_eq!(times[&hash], Some(Timestamp::new(100)));
        assert_eq!(times[&BlockHash::from("BB")], None);
    }

    #[tokio::test]
    async fn oldest_record_is_evicted_at_capacity() {
        let store = MemoryTimestampStore::new(2);
        for (i, h) in ["A", "B", "C"].iter().enumerate() {
            store
                .save_hash_timestamp(&BlockHash::from(*h), Timestamp::new(i as u64))
                .await
                .unwrap();
        }
        assert_eq!(store.len(), 2);
        let times = store
            .get_timestamps(&[BlockHash::from("A"), BlockHash::from("C")])
            .await
            .unwrap();
        assert_eq!(times[&BlockHash::from("A")], None);
        assert_eq!(times[&BlockHash::from("C")], Some(Timestamp::new(2)));
    }
}
