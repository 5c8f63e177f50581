//! Splice first-seen timestamps into upstream responses.
//!
//! The node's responses carry no arrival times. Each mapper looks the block
//! hashes up in the [`TimestampStore`] and adds a `timestamp` field (Unix
//! seconds, or `null` when the gateway never saw the block). A store failure
//! leaves the response as it was.

use std::collections::HashMap;

use gateway_store::TimestampStore;
use gateway_types::{BlockHash, Timestamp};
use serde_json::Value;

type TimestampMap = HashMap<BlockHash, Option<Timestamp>>;

async fn lookup(
    store: &dyn TimestampStore,
    hashes: &[BlockHash],
    context: &'static str,
) -> Option<TimestampMap> {
    match store.get_timestamps(hashes).await {
        Ok(map) => Some(map),
        Err(e) => {
            tracing::warn!(context, count = hashes.len(), error = %e, "cannot load timestamps");
            None
        }
    }
}

fn timestamp_value(map: &TimestampMap, hash: &str) -> Value {
    match map.get(&BlockHash::from(hash)).copied().flatten() {
        Some(ts) => Value::from(ts.as_secs()),
        None => Value::Null,
    }
}

/// `account_history`: annotate each entry of `history` by its `hash`.
pub async fn map_account_history(store: &dyn TimestampStore, mut response: Value) -> Value {
    let Some(history) = response.get_mut("history").and_then(Value::as_array_mut) else {
        return response;
    };
    let hashes: Vec<BlockHash> = history
        .iter()
        .filter_map(|tx| tx.get("hash").and_then(Value::as_str))
        .map(BlockHash::from)
        .collect();
    let Some(map) = lookup(store, &hashes, "account_history").await else {
        return response;
    };
    for tx in history.iter_mut() {
        let ts = tx
            .get("hash")
            .and_then(Value::as_str)
            .map(|h| timestamp_value(&map, h))
            .unwrap_or(Value::Null);
        if let Some(obj) = tx.as_object_mut() {
            obj.insert("timestamp".to_string(), ts);
        }
    }
    response
}

/// `blocks_info`: annotate each entry of the `blocks` object, using the
/// hashes the client asked for.
pub async fn map_blocks_info(
    store: &dyn TimestampStore,
    requested: &[BlockHash],
    response: Value,
) -> Value {
    let Some(map) = lookup(store, requested, "blocks_info").await else {
        return response;
    };
    annotate_blocks(response, &map)
}

/// `pending`: annotate each entry of the `blocks` object by its key.
pub async fn map_pending(store: &dyn TimestampStore, response: Value) -> Value {
    let hashes: Vec<BlockHash> = match response.get("blocks").and_then(Value::as_object) {
        Some(blocks) => blocks.keys().map(|k| BlockHash::from(k.as_str())).collect(),
        None => return response,
    };
    let Some(map) = lookup(store, &hashes, "pending").await else {
        return response;
    };
    annotate_blocks(response, &map)
}

fn annotate_blocks(mut response: Value, map: &TimestampMap) -> Value {
    if let Some(blocks) = response.get_mut("blocks").and_then(Value::as_object_mut) {
        for (hash, entry) in blocks.iter_mut() {
            if let Some(obj) = entry.as_object_mut() {
                obj.insert("timestamp".to_string(), timestamp_value(map, hash));
            }
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_store::MemoryTimestampStore;
    use serde_json::json;

    async fn store_with(entries: &[(&str, u64)]) -> MemoryTimestampStore {
        let store = MemoryTimestampStore::new(100);
        for (hash, secs) in entries {
            store
                .save_hash_timestamp(&BlockHash::from(*hash), Timestamp::new(*secs))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn history_entries_get_timestamps() {
        let store = store_with(&[("A", 10)]).await;
        let response = json!({
            "account": "qlc_x",
            "history": [ { "hash": "A", "amount": "1" }, { "hash": "B", "amount": "2" } ],
        });
        let mapped = map_account_history(&store, response).await;
        assert_eq!(mapped["history"][0]["timestamp"], 10);
        assert_eq!(mapped["history"][1]["timestamp"], Value::Null);
        assert_eq!(mapped["history"][1]["amount"], "2");
    }

    #[tokio::test]
    async fn history_without_entries_is_unchanged() {
        let store = store_with(&[]).await;
        let response = json!({ "error": "Account not found" });
        assert_eq!(map_account_history(&store, response.clone()).await, response);
    }

    #[tokio::test]
    async fn blocks_info_entries_get_timestamps() {
        let store = store_with(&[("H1", 42)]).await;
        let response = json!({ "blocks": { "H1": { "amount": "5" }, "H2": { "amount": "6" } } });
        let requested = [BlockHash::from("H1"), BlockHash::from("H2")];
        let mapped = map_blocks_info(&store, &requested, response).await;
        assert_eq!(mapped["blocks"]["H1"]["timestamp"], 42);
        assert_eq!(mapped["blocks"]["H2"]["timestamp"], Value::Null);
    }

    #[tokio::test]
    async fn pending_entries_get_timestamps() {
        let store = store_with(&[("P1", 7)]).await;
        let response = json!({ "blocks": { "P1": { "amount": "1", "source": "qlc_s" } } });
        let mapped = map_pending(&store, response).await;
        assert_eq!(mapped["blocks"]["P1"]["timestamp"], 7);
        assert_eq!(mapped["blocks"]["P1"]["source"], "qlc_s");
    }

    #[tokio::test]
    async fn non_object_block_entries_are_left_alone() {
        let store = store_with(&[]).await;
        let response = json!({ "blocks": { "qlc_acct": ["P1", "P2"] } });
        let mapped = map_pending(&store, response.clone()).await;
        assert_eq!(mapped, response);
    }
}
