//! Transport double for delivery tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::value_objects::ConnectionId;
use crate::ports::outbound::{Transport, TransportError};

/// Records every successful send; selected connections fail or stall
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(ConnectionId, String)>>,
    failing: Mutex<HashSet<ConnectionId>>,
    stalled: Mutex<HashSet<ConnectionId>>,
    closed: Mutex<Vec<ConnectionId>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, connection: ConnectionId) {
        self.failing.lock().insert(connection);
    }

    pub fn stall(&self, connection: ConnectionId) {
        self.stalled.lock().insert(connection);
    }

    pub fn sent_to(&self, connection: &ConnectionId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(c, _)| c == connection)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn total_sent(&self) -> usize {
        self.sent.lock().len()
    }

    /// Connections closed by the broadcaster, in order
    pub fn closed(&self) -> Vec<ConnectionId> {
        self.closed.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, connection: ConnectionId, payload: Arc<str>) -> Result<(), TransportError> {
        if self.failing.lock().contains(&connection) {
            return Err(TransportError::Closed(connection));
        }
        let stalled = self.stalled.lock().contains(&connection);
        if stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.sent.lock().push((connection, payload.to_string()));
        Ok(())
    }

    fn close(&self, connection: ConnectionId) {
        self.closed.lock().push(connection);
    }
}
