//! Abstract storage traits for the wallet gateway.
//!
//! Every storage backend (bounded in-process memory, Redis, in-memory fakes for
//! testing) implements these traits. The rest of the codebase depends only on
//! the traits.

pub mod cache;
pub mod error;
pub mod kv;
pub mod timestamp;

pub use cache::CacheBackend;
pub use error::StoreError;
pub use kv::KeyValueStore;
pub use timestamp::{MemoryTimestampStore, TimestampStore};
