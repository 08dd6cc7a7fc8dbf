//! Domain Events
//!
//! Raised by the ticket aggregate on every transition.

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{TicketId, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    Ticket(TicketEvent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketEvent {
    Created {
        ticket_id: TicketId,
        creator_id: UserId,
        at: DateTime<Utc>,
    },

    Accepted {
        ticket_id: TicketId,
        technician_id: UserId,
        at: DateTime<Utc>,
    },

    Assigned {
        ticket_id: TicketId,
        technician_id: UserId,
        assigned_by: UserId,
        at: DateTime<Utc>,
    },

    Completed {
        ticket_id: TicketId,
        at: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn aggregate_id(&self) -> &TicketId {
        match self {
            DomainEvent::Ticket(e) => match e {
                TicketEvent::Created { ticket_id, .. } => ticket_id,
                TicketEvent::Accepted { ticket_id, .. } => ticket_id,
                TicketEvent::Assigned { ticket_id, .. } => ticket_id,
                TicketEvent::Completed { ticket_id, .. } => ticket_id,
            },
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Ticket(e) => match e {
                TicketEvent::Created { .. } => "ticket.created",
                TicketEvent::Accepted { .. } => "ticket.accepted",
                TicketEvent::Assigned { .. } => "ticket.assigned",
                TicketEvent::Completed { .. } => "ticket.completed",
            },
        }
    }
}
