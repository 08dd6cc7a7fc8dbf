//! Role-based permissions
//!
//! One declarative table consulted once per request. Admin satisfies every
//! check; user administration lists Admin alone, so no other role inherits it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::value_objects::Role;
use crate::error::{DeskError, DeskResult};

/// Guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    CreateTicket,
    AssignTicket,
    AcceptTicket,
    CompleteTicket,
    ListTickets,
    ExportReport,
    ListUsers,
    CreateUser,
    DeleteUser,
}

use Role::*;

const SUPERVISORS: &[Role] = &[Manager, Director, Admin];
const TECHNICIANS: &[Role] = &[Technician];
const EVERYONE: &[Role] = &[Admin, Manager, Director, Technician];
const ADMIN_ONLY: &[Role] = &[Admin];

/// Action → roles allowed to perform it
pub const PERMISSIONS: &[(Action, &[Role])] = &[
    (Action::CreateTicket, SUPERVISORS),
    (Action::AssignTicket, SUPERVISORS),
    (Action::AcceptTicket, TECHNICIANS),
    (Action::CompleteTicket, TECHNICIANS),
    (Action::ListTickets, EVERYONE),
    (Action::ExportReport, SUPERVISORS),
    (Action::ListUsers, EVERYONE),
    (Action::CreateUser, ADMIN_ONLY),
    (Action::DeleteUser, ADMIN_ONLY),
];

impl Action {
    pub fn allowed_roles(&self) -> &'static [Role] {
        PERMISSIONS
            .iter()
            .find(|(action, _)| action == self)
            .map(|(_, roles)| *roles)
            .unwrap_or(&[])
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateTicket => "ticket.create",
            Action::AssignTicket => "ticket.assign",
            Action::AcceptTicket => "ticket.accept",
            Action::CompleteTicket => "ticket.complete",
            Action::ListTickets => "ticket.list",
            Action::ExportReport => "ticket.export",
            Action::ListUsers => "user.list",
            Action::CreateUser => "user.create",
            Action::DeleteUser => "user.delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure (role, action) → allow/deny
pub fn is_permitted(role: Role, action: Action) -> bool {
    role == Admin || action.allowed_roles().contains(&role)
}

/// Deny with `Forbidden` before any side effect
pub fn authorize(role: Role, action: Action) -> DeskResult<()> {
    if is_permitted(role, action) {
        Ok(())
    } else {
        tracing::warn!(%role, %action, "permission denied");
        Err(DeskError::Forbidden { action })
    }
}
