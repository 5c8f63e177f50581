//! Ledger account identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ledger address used as the subscription key.
///
/// The gateway treats accounts as opaque strings: no prefix or checksum
/// validation is performed, since the upstream node is the authority on
/// address encoding.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Account {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Account {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
