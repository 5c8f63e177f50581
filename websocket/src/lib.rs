//! Real-time notification fanout.
//!
//! Clients open a websocket, send `subscribe` / `unsubscribe` frames naming
//! ledger accounts, and receive a `newTransaction` frame for every ingested
//! block that touches one of those accounts.
//!
//! - [`ConnectionRegistry`]: bidirectional connection ↔ account index.
//! - [`LivenessMonitor`]: periodic ping sweep evicting dead connections.
//! - [`NotificationRouter`]: derives destinations for a block and fans out.
//! - [`server`]: axum websocket adapter implementing the transport capability.
//!
//! All registry work happens under the single [`SharedRegistry`] lock; none
//! of it performs I/O.

pub mod liveness;
pub mod registry;
pub mod router;
pub mod server;

use std::sync::Arc;

pub use liveness::{LivenessMonitor, DEFAULT_PING_INTERVAL, MIN_PING_INTERVAL};
pub use registry::{ConnectionRegistry, Liveness};
pub use router::{destinations, NotificationRouter};
pub use server::ws_handler;

/// The single serialization domain for every registry mutation.
pub type SharedRegistry = Arc<tokio::sync::Mutex<ConnectionRegistry>>;

/// Create an empty shared registry.
pub fn shared_registry() -> SharedRegistry {
    Arc::new(tokio::sync::Mutex::new(ConnectionRegistry::new()))
}
