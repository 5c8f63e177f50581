//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (wall clock, Redis, client sockets) are abstracted
//! behind traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod kv_store;
pub mod transport;

pub use clock::NullClock;
pub use kv_store::NullKeyValueStore;
pub use transport::{NullTransport, TransportRecord};
