//! Data Transfer Objects (DTOs)
//!
//! Objects for transferring data across boundaries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::aggregates::{Ticket, TicketStatus, User};
use crate::domain::value_objects::{Priority, Role, TicketId, UserId};

// =============================================================================
// Ticket Commands
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTicketCommand {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Blank or absent leaves the ticket unassigned
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub deadline_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AcceptTicketCommand {
    #[serde(default)]
    pub estimated_completion: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignTicketCommand {
    pub technician_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompleteTicketCommand {
    #[serde(default)]
    pub comments: Option<String>,
}

// =============================================================================
// User / Auth Commands
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateUserCommand {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginCommand {
    pub login: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserSummary,
}

// =============================================================================
// Views
// =============================================================================

/// Reference to a user embedded in a ticket snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id(),
            name: user.name().to_string(),
            role: user.role(),
        }
    }
}

/// Directory entry with derived presence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub last_seen: Option<DateTime<Utc>>,
    pub is_online: bool,
}

impl UserSummary {
    pub fn from_user(user: &User, now: DateTime<Utc>, online_window: Duration) -> Self {
        Self {
            id: *user.id(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            role: user.role(),
            last_seen: user.last_seen(),
            is_online: user.is_online(now, online_window),
        }
    }
}

/// Full ticket snapshot as returned by every ticket operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TicketStatus,
    pub creator: UserRef,
    pub assignee: Option<UserRef>,
    pub assigned_by: Option<UserRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub estimated_completion_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub photos: Vec<String>,
}

impl TicketView {
    /// `None` when the creator or assignee no longer resolves. A missing
    /// assigned-by user is dropped from the view instead.
    pub fn build(ticket: &Ticket, users: &HashMap<UserId, User>) -> Option<Self> {
        let creator = users.get(ticket.creator_id())?;
        let assignee = match ticket.assignee_id() {
            Some(id) => Some(UserRef::from(users.get(id)?)),
            None => None,
        };
        let assigned_by = ticket
            .assigned_by_id()
            .and_then(|id| users.get(id))
            .map(UserRef::from);

        Some(Self {
            id: *ticket.id(),
            title: ticket.title().to_string(),
            description: ticket.description().to_string(),
            priority: ticket.priority(),
            status: ticket.status(),
            creator: UserRef::from(creator),
            assignee,
            assigned_by,
            created_at: ticket.created_at(),
            updated_at: ticket.updated_at(),
            completed_at: ticket.completed_at(),
            deadline_at: ticket.deadline_at(),
            estimated_completion_at: ticket.estimated_completion_at(),
            comments: ticket.comments().map(str::to_string),
            photos: ticket.photos().to_vec(),
        })
    }
}

/// Rendered report ready for download
#[derive(Clone, Debug)]
pub struct ReportDocument {
    pub content_type: &'static str,
    pub file_name: String,
    pub body: Vec<u8>,
}

// =============================================================================
// Notifications
// =============================================================================

/// Wire payload pushed to every live connection of a recipient
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub event: String,
    pub ticket: TicketView,
}

/// Committed change plus who should hear about it
#[derive(Clone, Debug)]
pub struct TicketNotification {
    pub envelope: NotificationEnvelope,
    pub recipients: Vec<UserId>,
}
