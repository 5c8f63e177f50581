//! Cache keys with fixed meaning.
//!
//! Proof-of-work results are keyed by the block hash they were computed for;
//! the online representative list lives under a single constant key.

use std::time::Duration;

/// Key holding the JSON-serialized `representatives_online` response.
pub const ONLINE_REPRESENTATIVES_KEY: &str = "online-representatives";

/// Retention for the representative list: short enough to bound staleness,
/// long enough to absorb bursts of wallet start-ups.
pub const REPRESENTATIVES_TTL: Duration = Duration::from_secs(5 * 60);
