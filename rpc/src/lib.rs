//! RPC proxy in front of the upstream ledger node.
//!
//! Provides:
//! - An allow-list of read-mostly actions wallets may call
//! - Result caching for `work_generate` (by block hash) and
//!   `representatives_online` (single short-lived key)
//! - First-seen timestamps spliced into history, pending and blocks_info
//!   responses

pub mod allow_list;
pub mod error;
pub mod handlers;
pub mod proxy;
pub mod timestamps;

pub use allow_list::{is_allowed, ALLOWED_ACTIONS};
pub use error::RpcError;
pub use handlers::rpc_handler;
pub use proxy::{ProxyConfig, RpcProxy};
