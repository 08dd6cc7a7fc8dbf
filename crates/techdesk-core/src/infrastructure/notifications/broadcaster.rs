//! Fan-out of ticket notifications to live connections

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::application::dto::NotificationEnvelope;
use crate::domain::value_objects::UserId;
use crate::infrastructure::notifications::ConnectionRegistry;
use crate::ports::outbound::{Transport, TransportError};

/// Outcome of one broadcast
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    transport: Arc<dyn Transport>,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        transport: Arc<dyn Transport>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            send_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send `envelope` to every connection of every recipient.
    ///
    /// Connections are snapshotted up front and sent to concurrently. A
    /// failed or timed-out send drops that connection from the registry,
    /// closes it on the transport and does not affect the others.
    pub async fn broadcast(&self, envelope: &NotificationEnvelope, recipients: &[UserId]) -> DeliveryReport {
        let payload: Arc<str> = match serde_json::to_string(envelope) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize notification");
                return DeliveryReport::default();
            }
        };

        let targets: Vec<_> = recipients
            .iter()
            .flat_map(|user| {
                self.registry
                    .connections_for(user)
                    .into_iter()
                    .map(move |conn| (*user, conn))
            })
            .collect();

        let sends = targets.into_iter().map(|(user, conn)| {
            let payload = Arc::clone(&payload);
            async move {
                let result = match timeout(self.send_timeout, self.transport.send(conn, payload)).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout(conn)),
                };
                (user, conn, result)
            }
        });

        let mut report = DeliveryReport::default();
        for (user, conn, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(user_id = %user, connection = %conn, error = %e, "dropping connection");
                    self.registry.unregister(&user, &conn);
                    self.transport.close(conn);
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            event = %envelope.event,
            delivered = report.delivered,
            failed = report.failed,
            "notification broadcast"
        );
        report
    }
}
