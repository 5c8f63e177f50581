//! Block hash identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded hash identifying a block, as reported by the upstream node.
///
/// Kept in its textual form: the gateway only uses it as a cache key and
/// as the primary key of the timestamp table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(String);

impl BlockHash {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
