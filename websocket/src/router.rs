//! Block notification router.
//!
//! Turns one ingested [`BlockEvent`] into its destination accounts and fans
//! a single `newTransaction` frame out to every subscriber of each.

use gateway_types::{Account, Block, BlockEvent, ServerEvent};

use crate::SharedRegistry;

/// Accounts that should hear about `event`.
///
/// - `state` block: the block's own account, plus `link_as_account` when the
///   block is a send and the link is present.
/// - legacy block: its `destination` only.
///
/// The block's own account is the callback's top-level `account`, falling
/// back to the block body's. Duplicates are removed, so a self-send notifies
/// each subscriber once.
pub fn destinations(event: &BlockEvent) -> Vec<Account> {
    let mut out: Vec<Account> = Vec::with_capacity(2);
    match &event.block {
        Block::State(state) => {
            if event.is_send {
                if let Some(link) = &state.link_as_account {
                    out.push(link.clone());
                }
            }
            if let Some(own) = event.account.as_ref().or(state.account.as_ref()) {
                if !out.contains(own) {
                    out.push(own.clone());
                }
            }
        }
        Block::Legacy(legacy) => {
            if let Some(dest) = &legacy.destination {
                out.push(dest.clone());
            }
        }
    }
    out
}

pub struct NotificationRouter {
    registry: SharedRegistry,
}

impl NotificationRouter {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Deliver `event` to every interested connection. Returns the total
    /// number of frames enqueued across all destinations.
    pub async fn route(&self, event: &BlockEvent) -> usize {
        let targets = destinations(event);
        if targets.is_empty() {
            tracing::debug!(hash = %event.hash, "block has no destination account");
            return 0;
        }

        let frame = match ServerEvent::NewTransaction(event.payload.clone()).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(hash = %event.hash, error = %e, "failed to encode notification");
                return 0;
            }
        };

        let registry = self.registry.lock().await;
        let mut delivered = 0;
        for account in &targets {
            let sent = registry.broadcast(account, &frame);
            if sent > 0 {
                tracing::info!(
                    destination = %account,
                    amount = event.amount.as_deref().unwrap_or(""),
                    subscribers = sent,
                    "sending block to subscribers"
                );
            }
            delivered += sent;
        }
        delivered
    }
}
