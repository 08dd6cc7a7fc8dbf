//! Who sees which ticket, and who hears about it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::aggregates::{Ticket, TicketStatus, User};
use crate::domain::value_objects::{Role, UserId};

/// Authenticated identity behind a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Supervisors see everything; a technician sees claimable work plus
    /// whatever is assigned to them.
    pub fn can_see(&self, ticket: &Ticket) -> bool {
        match self.role {
            Role::Admin | Role::Manager | Role::Director => true,
            Role::Technician => {
                matches!(ticket.status(), TicketStatus::New | TicketStatus::Assigned)
                    || ticket.is_assigned_to(&self.user_id)
            }
        }
    }
}

/// Listing filter handed to the ticket repository
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketQuery {
    /// Role scope; `None` returns every ticket
    pub caller: Option<Caller>,
    /// Drop tickets completed before this instant. Open tickets always pass.
    pub completed_since: Option<DateTime<Utc>>,
}

impl TicketQuery {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let in_scope = self.caller.map_or(true, |c| c.can_see(ticket));
        let in_window = match (self.completed_since, ticket.completed_at()) {
            (Some(since), Some(done)) => done >= since,
            _ => true,
        };
        in_scope && in_window
    }
}

/// Soft invisibility: creator (and assignee, when set) must still resolve
pub fn references_resolve(ticket: &Ticket, users: &HashMap<UserId, User>) -> bool {
    users.contains_key(ticket.creator_id())
        && ticket.assignee_id().map_or(true, |id| users.contains_key(id))
}

/// Creator, current assignee and every supervisor, deduplicated
pub fn interested_parties<'a>(
    ticket: &Ticket,
    users: impl IntoIterator<Item = &'a User>,
) -> Vec<UserId> {
    let mut recipients = vec![*ticket.creator_id()];
    if let Some(assignee) = ticket.assignee_id() {
        recipients.push(*assignee);
    }
    recipients.extend(
        users
            .into_iter()
            .filter(|u| u.role().is_supervisor())
            .map(|u| *u.id()),
    );
    recipients.sort();
    recipients.dedup();
    recipients
}
