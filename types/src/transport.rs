//! Outbound capability of a client connection.
//!
//! The notification core never touches sockets directly: the transport layer
//! hands the registry an implementation of [`Transport`] when a connection is
//! accepted, and the registry drives it. Implementations must not block;
//! `send` only enqueues onto the connection's outbound path, which preserves
//! FIFO order per connection.

use crate::TransportError;

pub trait Transport: Send + Sync {
    /// Enqueue a serialized frame for delivery.
    fn send(&self, frame: &str) -> Result<(), TransportError>;

    /// Enqueue a liveness probe.
    fn ping(&self) -> Result<(), TransportError>;

    /// Forcibly close the connection. Idempotent.
    fn terminate(&self);
}
