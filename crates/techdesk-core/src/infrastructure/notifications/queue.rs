//! Bounded hand-off between committed mutations and delivery

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::application::dto::TicketNotification;
use crate::infrastructure::notifications::Broadcaster;
use crate::ports::outbound::NotificationSink;

/// Sender half of the notification queue.
///
/// Enqueueing never waits: a full or closed queue drops the notification
/// with a warning. A single dispatcher drains the queue in order, so every
/// connection sees events in commit order.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<TicketNotification>,
}

impl NotificationQueue {
    /// Spawn the dispatcher task. It exits once every queue handle is dropped.
    pub fn start(broadcaster: Arc<Broadcaster>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<TicketNotification>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                broadcaster
                    .broadcast(&notification.envelope, &notification.recipients)
                    .await;
            }
            tracing::debug!("notification dispatcher stopped");
        });

        (Self { tx }, handle)
    }
}

impl NotificationSink for NotificationQueue {
    fn enqueue(&self, notification: TicketNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                tracing::warn!(event = %n.envelope.event, ticket_id = %n.envelope.ticket.id, "notification queue full, dropping");
            }
            Err(TrySendError::Closed(n)) => {
                tracing::warn!(event = %n.envelope.event, ticket_id = %n.envelope.ticket.id, "notification dispatcher gone, dropping");
            }
        }
    }
}
