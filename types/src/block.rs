//! Block payloads delivered by the upstream node's HTTP callback.
//!
//! The node reports two block shapes: the modern `state` block, which carries
//! its own account and (for sends) a `link_as_account` recipient, and the
//! legacy `send`/`receive`/`open`/`change` blocks, which name a `destination`.
//! Both are unified under [`Block`] so destination derivation can match on a
//! single tagged variant.

use serde::Deserialize;
use serde_json::Value;

use crate::{Account, BlockHash, PayloadError};

/// Block type tag of the modern block shape.
pub const STATE_BLOCK_TYPE: &str = "state";

/// Modern `state` block: the fields destination derivation needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StateBlock {
    #[serde(default, deserialize_with = "non_empty_account")]
    pub account: Option<Account>,
    #[serde(default, deserialize_with = "non_empty_account")]
    pub link_as_account: Option<Account>,
}

/// Legacy (non-`state`) block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LegacyBlock {
    #[serde(rename = "type", default)]
    pub block_type: String,
    #[serde(default, deserialize_with = "non_empty_account")]
    pub destination: Option<Account>,
}

/// A block in either of the shapes the node reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    State(StateBlock),
    Legacy(LegacyBlock),
}

impl Block {
    /// Interpret a parsed block object. Anything whose `type` is not
    /// `"state"` is treated as legacy, including a missing tag.
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        if !value.is_object() {
            return Err(PayloadError::MalformedBlock(
                "block must be a JSON object".to_string(),
            ));
        }
        let is_state = value.get("type").and_then(Value::as_str) == Some(STATE_BLOCK_TYPE);
        let block = if is_state {
            Block::State(StateBlock::deserialize(value)?)
        } else {
            Block::Legacy(LegacyBlock::deserialize(value)?)
        };
        Ok(block)
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Block::State(_))
    }
}

/// One ledger update, as ingested from the node callback.
///
/// `payload` is the full callback body with its `block` field replaced by the
/// parsed block object; it is what subscribers receive verbatim.
#[derive(Clone, Debug)]
pub struct BlockEvent {
    pub hash: BlockHash,
    pub block: Block,
    pub is_send: bool,
    pub account: Option<Account>,
    pub amount: Option<String>,
    pub payload: Value,
}

impl BlockEvent {
    /// Parse a raw callback body.
    ///
    /// The `block` field may be an object or a JSON-encoded string (the node
    /// sends the latter). `is_send` may be a boolean or the strings
    /// `"true"`/`"false"`; `amount` may be a string or a number.
    pub fn from_callback(mut payload: Value) -> Result<Self, PayloadError> {
        let fields = payload.as_object_mut().ok_or(PayloadError::NotAnObject)?;

        let hash = fields
            .get("hash")
            .and_then(Value::as_str)
            .map(BlockHash::from)
            .ok_or(PayloadError::MissingField("hash"))?;

        let block_value = match fields.get("block") {
            Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded)
                .map_err(|e| PayloadError::MalformedBlock(e.to_string()))?,
            Some(obj @ Value::Object(_)) => obj.clone(),
            Some(_) => {
                return Err(PayloadError::MalformedBlock(
                    "block must be an object or a JSON-encoded string".to_string(),
                ))
            }
            None => return Err(PayloadError::MissingField("block")),
        };
        let block = Block::from_value(&block_value)?;

        let is_send = match fields.get("is_send") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        };

        let account = fields
            .get("account")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(Account::from);

        let amount = match fields.get("amount") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        fields.insert("block".to_string(), block_value);

        Ok(Self {
            hash,
            block,
            is_send,
            account,
            amount,
            payload,
        })
    }

    /// Parse a raw callback body from its textual form.
    pub fn from_callback_str(body: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_callback(value)
    }
}

/// Treat `""` the same as an absent account, as the node uses empty strings
/// for unset link fields.
fn non_empty_account<'de, D>(deserializer: D) -> Result<Option<Account>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(Account::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_callback(is_send: Value) -> Value {
        json!({
            "hash": "AB12",
            "account": "qlc_sender",
            "amount": "1000",
            "is_send": is_send,
            "block": json!({
                "type": "state",
                "account": "qlc_sender",
                "link_as_account": "qlc_recipient",
            }).to_string(),
        })
    }

    #[test]
    fn parses_string_encoded_state_block() {
        let event = BlockEvent::from_callback(state_callback(json!("true"))).unwrap();
        assert_eq!(event.hash, BlockHash::from("AB12"));
        assert!(event.is_send);
        assert_eq!(event.account, Some(Account::from("qlc_sender")));
        assert_eq!(event.amount.as_deref(), Some("1000"));
        match &event.block {
            Block::State(state) => {
                assert_eq!(state.link_as_account, Some(Account::from("qlc_recipient")));
            }
            other => panic!("expected state block, got {other:?}"),
        }
        // The forwarded payload carries the parsed block, not the string.
        assert_eq!(event.payload["block"]["type"], "state");
    }

    #[test]
    fn accepts_boolean_send_flag_and_object_block() {
        let payload = json!({
            "hash": "CD34",
            "account": "qlc_a",
            "is_send": false,
            "amount": 5,
            "block": { "type": "state", "link_as_account": "" },
        });
        let event = BlockEvent::from_callback(payload).unwrap();
        assert!(!event.is_send);
        assert_eq!(event.amount.as_deref(), Some("5"));
        assert_eq!(event.block, Block::State(StateBlock::default()));
    }

    #[test]
    fn non_state_type_is_legacy() {
        let payload = json!({
            "hash": "EF56",
            "block": { "type": "send", "destination": "qlc_dest" },
        });
        let event = BlockEvent::from_callback(payload).unwrap();
        assert_eq!(
            event.block,
            Block::Legacy(LegacyBlock {
                block_type: "send".to_string(),
                destination: Some(Account::from("qlc_dest")),
            })
        );
        assert!(event.account.is_none());
    }

    #[test]
    fn unparsable_block_string_is_rejected() {
        let payload = json!({ "hash": "00", "block": "{not json" });
        let err = BlockEvent::from_callback(payload).unwrap_err();
        assert!(matches!(err, PayloadError::MalformedBlock(_)));
    }

    #[test]
    fn missing_hash_is_rejected() {
        let payload = json!({ "block": { "type": "state" } });
        let err = BlockEvent::from_callback(payload).unwrap_err();
        assert!(matches!(err, PayloadError::MissingField("hash")));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = BlockEvent::from_callback_str("[1,2,3]").unwrap_err();
        assert!(matches!(err, PayloadError::NotAnObject));
    }
}
