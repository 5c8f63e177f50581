//! Nullable transport: record outbound frames instead of writing to a socket.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gateway_types::{Transport, TransportError};

/// Everything the gateway did to one connection.
#[derive(Default)]
pub struct TransportRecord {
    sent: Mutex<Vec<String>>,
    pings: AtomicUsize,
    terminated: AtomicBool,
}

impl TransportRecord {
    /// All frames "sent", in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

/// A test transport. Hand the transport to the registry and keep the
/// [`TransportRecord`] for assertions.
pub struct NullTransport {
    record: Arc<TransportRecord>,
}

impl NullTransport {
    pub fn new() -> (Self, Arc<TransportRecord>) {
        let record = Arc::new(TransportRecord::default());
        (
            Self {
                record: record.clone(),
            },
            record,
        )
    }
}

impl Transport for NullTransport {
    fn send(&self, frame: &str) -> Result<(), TransportError> {
        if self.record.is_terminated() {
            return Err(TransportError::Closed);
        }
        self.record.sent.lock().unwrap().push(frame.to_string());
        Ok(())
    }

    fn ping(&self) -> Result<(), TransportError> {
        if self.record.is_terminated() {
            return Err(TransportError::Closed);
        }
        self.record.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn terminate(&self) {
        self.record.terminated.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_until_terminated() {
        let (transport, record) = NullTransport::new();
        transport.send("one").unwrap();
        transport.ping().unwrap();
        transport.terminate();
        assert_eq!(transport.send("two"), Err(TransportError::Closed));
        assert_eq!(record.sent(), vec!["one".to_string()]);
        assert_eq!(record.pings(), 1);
        assert!(record.is_terminated());
    }
}
