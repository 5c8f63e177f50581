//! Messages exchanged with notification clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Account, PayloadError};

/// A frame sent by a client over its notification connection.
///
/// Wire form: `{"event": "subscribe" | "unsubscribe", "data": [account, ...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe(Vec<Account>),
    Unsubscribe(Vec<Account>),
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A frame pushed by the gateway to subscribed clients.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A block touching one of the client's subscribed accounts.
    #[serde(rename = "newTransaction")]
    NewTransaction(Value),
}

impl ServerEvent {
    /// Serialize for the wire. Done once per event, not once per subscriber.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
