//! Actions wallets are allowed to forward to the node.

pub const ALLOWED_ACTIONS: &[&str] = &[
    "account_history",
    "account_history_topn",
    "account_info",
    "accounts_frontiers",
    "accounts_balances",
    "accounts_pending",
    "block",
    "blocks",
    "block_count",
    "blocks_info",
    "delegators_count",
    "pending",
    "process",
    "representatives_online",
    "validate_account_number",
    "work_generate",
    "tokens",
];

pub fn is_allowed(action: &str) -> bool {
    ALLOWED_ACTIONS.contains(&action)
}
