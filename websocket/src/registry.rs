//! Connection registry: the bidirectional index between open client
//! connections and the accounts they watch.
//!
//! Each connection records its own subscription set, and a global index maps
//! every account to the connections subscribed to it. Both sides are kept in
//! step so that tearing down a connection only walks that connection's own
//! subscriptions, never the whole index.
//!
//! Invariants:
//! - a connection appears at most once in any account's subscriber set;
//! - an account whose subscriber set becomes empty is dropped from the index.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use gateway_types::{Account, ConnectionId, Transport};

/// Liveness state of a connection, driven by the liveness monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Liveness {
    /// Answered the last probe (or has not been probed yet).
    Alive,
    /// Probed during the last sweep, no reply seen since.
    PingSent,
}

pub(crate) struct ConnectionEntry {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) subscriptions: HashSet<Account>,
    pub(crate) liveness: Liveness,
}

pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    index: HashMap<Account, HashSet<ConnectionId>>,
    next_id: u64,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Track a newly accepted connection and return its handle.
    pub fn register(&mut self, transport: Arc<dyn Transport>) -> ConnectionId {
        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        self.connections.insert(
            id,
            ConnectionEntry {
                transport,
                subscriptions: HashSet::new(),
                liveness: Liveness::Alive,
            },
        );
        id
    }

    /// Subscribe `id` to each of `accounts`. Accounts it already watches are
    /// skipped. Returns how many subscriptions were added.
    pub fn subscribe<I>(&mut self, id: ConnectionId, accounts: I) -> usize
    where
        I: IntoIterator<Item = Account>,
    {
        let Some(entry) = self.connections.get_mut(&id) else {
            tracing::warn!(connection = %id, "subscribe on unknown connection");
            return 0;
        };
        let mut added = 0;
        for account in accounts {
            if !entry.subscriptions.insert(account.clone()) {
                continue;
            }
            self.index.entry(account).or_default().insert(id);
            added += 1;
        }
        added
    }

    /// Remove each of `accounts` from `id`'s subscriptions. Accounts it never
    /// watched are skipped. Returns how many subscriptions were removed.
    pub fn unsubscribe<I>(&mut self, id: ConnectionId, accounts: I) -> usize
    where
        I: IntoIterator<Item = Account>,
    {
        let Some(entry) = self.connections.get_mut(&id) else {
            tracing::warn!(connection = %id, "unsubscribe on unknown connection");
            return 0;
        };
        let mut removed = 0;
        for account in accounts {
            if !entry.subscriptions.remove(&account) {
                continue;
            }
            unlink(&mut self.index, &account, id);
            removed += 1;
        }
        removed
    }

    /// Forget a closed connection, unlinking it from every account it
    /// watched. Returns `false` if the handle was not (or no longer) tracked.
    pub fn remove_connection(&mut self, id: ConnectionId) -> bool {
        let Some(entry) = self.connections.remove(&id) else {
            return false;
        };
        for account in &entry.subscriptions {
            unlink(&mut self.index, account, id);
        }
        tracing::debug!(
            connection = %id,
            subscriptions = entry.subscriptions.len(),
            "connection removed"
        );
        true
    }

    /// Terminate and forget every connection. Returns how many were open.
    pub fn terminate_all(&mut self) -> usize {
        let count = self.connections.len();
        for (_, entry) in self.connections.drain() {
            entry.transport.terminate();
        }
        self.index.clear();
        count
    }

    /// Enqueue `frame` on every connection subscribed to `account`.
    ///
    /// Fire-and-forget: returns how many connections accepted the frame onto
    /// their outbound path; nothing waits for delivery.
    pub fn broadcast(&self, account: &Account, frame: &str) -> usize {
        let Some(subscribers) = self.index.get(account) else {
            return 0;
        };
        let mut delivered = 0;
        for id in subscribers {
            let Some(entry) = self.connections.get(id) else {
                tracing::warn!(
                    connection = %id,
                    account = %account,
                    "indexed subscriber has no connection entry"
                );
                continue;
            };
            match entry.transport.send(frame) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::debug!(connection = %id, error = %e, "dropping frame"),
            }
        }
        delivered
    }

    /// Record a probe reply from `id`.
    pub fn mark_alive(&mut self, id: ConnectionId) {
        if let Some(entry) = self.connections.get_mut(&id) {
            entry.liveness = Liveness::Alive;
        }
    }

    pub fn liveness(&self, id: ConnectionId) -> Option<Liveness> {
        self.connections.get(&id).map(|e| e.liveness)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn is_subscribed(&self, id: ConnectionId, account: &Account) -> bool {
        self.connections
            .get(&id)
            .is_some_and(|e| e.subscriptions.contains(account))
    }

    /// Accounts `id` is subscribed to, if the connection is tracked.
    pub fn subscriptions_of(&self, id: ConnectionId) -> Option<Vec<Account>> {
        self.connections
            .get(&id)
            .map(|e| e.subscriptions.iter().cloned().collect())
    }

    /// Number of connections currently subscribed to `account`.
    pub fn subscriber_count(&self, account: &Account) -> usize {
        self.index.get(account).map_or(0, HashSet::len)
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connection is open.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of accounts with at least one subscriber.
    pub fn account_count(&self) -> usize {
        self.index.len()
    }

    /// Check that both sides of the index agree and no empty subscriber set
    /// is left behind.
    pub fn is_consistent(&self) -> bool {
        let forward_ok = self.connections.iter().all(|(id, entry)| {
            entry
                .subscriptions
                .iter()
                .all(|a| self.index.get(a).is_some_and(|subs| subs.contains(id)))
        });
        let backward_ok = self.index.iter().all(|(account, subs)| {
            !subs.is_empty()
                && subs.iter().all(|id| {
                    self.connections
                        .get(id)
                        .is_some_and(|e| e.subscriptions.contains(account))
                })
        });
        forward_ok && backward_ok
    }

    pub(crate) fn entries_mut(
        &mut self,
    ) -> impl Iterator<Item = (&ConnectionId, &mut ConnectionEntry)> {
        self.connections.iter_mut()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop `id` from `account`'s subscriber set, pruning the set if it empties.
/// A missing link means the two sides of the index drifted apart; that is a
/// leak worth reporting but not worth failing the caller over.
fn unlink(index: &mut HashMap<Account, HashSet<ConnectionId>>, account: &Account, id: ConnectionId) {
    let Some(subscribers) = index.get_mut(account) else {
        tracing::warn!(
            connection = %id,
            account = %account,
            "account missing from subscription index, potential leak"
        );
        return;
    };
    if !subscribers.remove(&id) {
        tracing::warn!(
            connection = %id,
            account = %account,
            "connection missing from account's subscribers, potential leak"
        );
    }
    if subscribers.is_empty() {
        index.remove(account);
    }
}
