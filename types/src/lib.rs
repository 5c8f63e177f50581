//! Fundamental types for the wallet gateway.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identifiers, block payloads, connection handles, the client/server
//! wire messages and the transport capability the notification core depends on.

pub mod account;
pub mod block;
pub mod connection;
pub mod error;
pub mod hash;
pub mod message;
pub mod time;
pub mod transport;

pub use account::Account;
pub use block::{Block, BlockEvent, LegacyBlock, StateBlock};
pub use connection::ConnectionId;
pub use error::{PayloadError, TransportError};
pub use hash::BlockHash;
pub use message::{ClientMessage, ServerEvent};
pub use time::Timestamp;
pub use transport::Transport;
