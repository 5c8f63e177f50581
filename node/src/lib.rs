//! Wallet gateway node.
//!
//! Sits between wallet clients and a QLC node:
//! - ingests confirmed-block callbacks on `POST /new-block` and pushes
//!   `newTransaction` events to websocket clients subscribed to the accounts
//!   involved;
//! - proxies an allow-listed subset of the node's JSON-RPC on `POST /`,
//!   caching proof-of-work and the online representative list and stamping
//!   history entries with first-seen times;
//! - keeps websocket connections honest with a periodic ping sweep.

pub mod app;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod shutdown;
pub mod stats;

pub use app::{build_router, GatewayState};
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use logging::{init_logging, LogFormat};
pub use metrics::GatewayMetrics;
pub use shutdown::ShutdownController;
pub use stats::{StatsReporter, StatsSnapshot};
