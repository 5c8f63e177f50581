//! Shared utilities for the wallet gateway.

pub mod stats;
pub mod time;

pub use stats::WindowCounter;
pub use time::format_duration;
