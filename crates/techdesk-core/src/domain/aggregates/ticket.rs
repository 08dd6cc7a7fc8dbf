//! Ticket Aggregate
//!
//! Owns the status state machine and the assignee invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::user::User;
use crate::domain::events::{DomainEvent, TicketEvent};
use crate::domain::value_objects::{Priority, Role, TicketId, UserId};
use crate::error::DeskError;

/// Photo references attached at creation
pub const MAX_PHOTOS: usize = 5;

/// Ticket aggregate root
#[derive(Clone, Debug)]
pub struct Ticket {
    id: TicketId,
    title: String,
    description: String,
    priority: Priority,
    status: TicketStatus,
    creator_id: UserId,
    assignee_id: Option<UserId>,
    assigned_by_id: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    deadline_at: Option<DateTime<Utc>>,
    estimated_completion_at: Option<DateTime<Utc>>,
    comments: Option<String>,
    photos: Vec<String>,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    New,
    Assigned,
    InProgress,
    Completed,
    /// Reserved: no transition leads here
    Cancelled,
}

/// Input for [`Ticket::create`]
#[derive(Clone, Debug)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub deadline_at: Option<DateTime<Utc>>,
    pub photos: Vec<String>,
}

impl Ticket {
    /// Open a ticket. A pre-selected assignee must be a technician; it does
    /// not count as a manager assignment, so `assigned_by` stays empty.
    pub fn create(
        input: NewTicket,
        creator: &User,
        assignee: Option<&User>,
        now: DateTime<Utc>,
    ) -> Result<Self, TicketError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(TicketError::BlankTitle);
        }
        if input.photos.len() > MAX_PHOTOS {
            return Err(TicketError::TooManyPhotos(input.photos.len()));
        }
        if let Some(user) = assignee {
            ensure_technician(user)?;
        }

        let id = TicketId::new();
        let mut ticket = Self {
            id,
            title,
            description: input.description,
            priority: input.priority,
            status: TicketStatus::New,
            creator_id: *creator.id(),
            assignee_id: assignee.map(|u| *u.id()),
            assigned_by_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            deadline_at: input.deadline_at,
            estimated_completion_at: None,
            comments: None,
            photos: input.photos,
            events: vec![],
        };

        ticket.raise_event(DomainEvent::Ticket(TicketEvent::Created {
            ticket_id: id,
            creator_id: *creator.id(),
            at: now,
        }));

        Ok(ticket)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &TicketId { &self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn description(&self) -> &str { &self.description }
    pub fn priority(&self) -> Priority { self.priority }
    pub fn status(&self) -> TicketStatus { self.status }
    pub fn creator_id(&self) -> &UserId { &self.creator_id }
    pub fn assignee_id(&self) -> Option<&UserId> { self.assignee_id.as_ref() }
    pub fn assigned_by_id(&self) -> Option<&UserId> { self.assigned_by_id.as_ref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn completed_at(&self) -> Option<DateTime<Utc>> { self.completed_at }
    pub fn deadline_at(&self) -> Option<DateTime<Utc>> { self.deadline_at }
    pub fn estimated_completion_at(&self) -> Option<DateTime<Utc>> { self.estimated_completion_at }
    pub fn comments(&self) -> Option<&str> { self.comments.as_deref() }
    pub fn photos(&self) -> &[String] { &self.photos }

    pub fn is_assigned_to(&self, user_id: &UserId) -> bool {
        self.assignee_id.as_ref() == Some(user_id)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Technician takes the ticket into work.
    ///
    /// `New` is first-come; `Assigned` only by the designated technician.
    pub fn accept(
        &mut self,
        technician: &User,
        estimated_completion_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), TicketError> {
        ensure_technician(technician)?;

        match self.status {
            TicketStatus::New => {}
            TicketStatus::Assigned => {
                if !self.is_assigned_to(technician.id()) {
                    return Err(TicketError::AssignedToAnother);
                }
            }
            status => return Err(TicketError::NotClaimable(status)),
        }

        self.assignee_id = Some(*technician.id());
        self.status = TicketStatus::InProgress;
        self.estimated_completion_at = estimated_completion_at;
        self.touch(now);

        self.raise_event(DomainEvent::Ticket(TicketEvent::Accepted {
            ticket_id: self.id,
            technician_id: *technician.id(),
            at: now,
        }));

        Ok(())
    }

    /// Manager hands the ticket to a technician. No status guard; a
    /// completed ticket is reopened and loses its completion time.
    pub fn assign(
        &mut self,
        technician: &User,
        assigned_by: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), TicketError> {
        ensure_technician(technician)?;

        self.assignee_id = Some(*technician.id());
        self.assigned_by_id = Some(*assigned_by);
        self.status = TicketStatus::Assigned;
        self.completed_at = None;
        self.touch(now);

        self.raise_event(DomainEvent::Ticket(TicketEvent::Assigned {
            ticket_id: self.id,
            technician_id: *technician.id(),
            assigned_by: *assigned_by,
            at: now,
        }));

        Ok(())
    }

    /// Close the ticket. Any status may be completed.
    pub fn complete(&mut self, comments: Option<String>, now: DateTime<Utc>) {
        self.status = TicketStatus::Completed;
        self.completed_at = Some(now);
        self.comments = comments;
        self.touch(now);

        self.raise_event(DomainEvent::Ticket(TicketEvent::Completed {
            ticket_id: self.id,
            at: now,
        }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

fn ensure_technician(user: &User) -> Result<(), TicketError> {
    if user.role() == Role::Technician {
        Ok(())
    } else {
        Err(TicketError::NotATechnician(*user.id()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    BlankTitle,
    TooManyPhotos(usize),
    NotATechnician(UserId),
    NotClaimable(TicketStatus),
    AssignedToAnother,
}

impl std::error::Error for TicketError {}

impl std::fmt::Display for TicketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "Title must not be blank"),
            Self::TooManyPhotos(n) => write!(f, "At most {} photos allowed, got {}", MAX_PHOTOS, n),
            Self::NotATechnician(id) => write!(f, "User {} is not a technician", id),
            Self::NotClaimable(status) => write!(f, "Ticket in status {:?} cannot be accepted", status),
            Self::AssignedToAnother => write!(f, "Ticket is assigned to another technician"),
        }
    }
}

impl From<TicketError> for DeskError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::BlankTitle
            | TicketError::TooManyPhotos(_)
            | TicketError::NotATechnician(_) => DeskError::Validation(err.to_string()),
            TicketError::NotClaimable(_) | TicketError::AssignedToAnother => {
                DeskError::InvalidState(err.to_string())
            }
        }
    }
}
