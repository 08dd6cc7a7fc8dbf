//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces.

use async_trait::async_trait;

use crate::application::dto::*;
use crate::domain::services::Caller;
use crate::domain::value_objects::{Period, UserId};
use crate::error::DeskResult;

/// Ticket lifecycle use cases
#[async_trait]
pub trait TicketUseCases: Send + Sync {
    /// Supervisors open a ticket, optionally pre-assigned
    async fn create_ticket(&self, caller: Caller, command: CreateTicketCommand) -> DeskResult<TicketView>;

    /// Technician claims a `New` ticket or starts one assigned to them
    async fn accept_ticket(
        &self,
        caller: Caller,
        ticket_id: &str,
        command: AcceptTicketCommand,
    ) -> DeskResult<TicketView>;

    /// Supervisor hands a ticket to a technician
    async fn assign_ticket(
        &self,
        caller: Caller,
        ticket_id: &str,
        command: AssignTicketCommand,
    ) -> DeskResult<TicketView>;

    async fn complete_ticket(
        &self,
        caller: Caller,
        ticket_id: &str,
        command: CompleteTicketCommand,
    ) -> DeskResult<TicketView>;

    /// Role-scoped listing, newest first
    async fn list_tickets(&self, caller: Caller, period: Option<Period>) -> DeskResult<Vec<TicketView>>;

    async fn get_ticket(&self, caller: Caller, ticket_id: &str) -> DeskResult<TicketView>;

    async fn export_report(&self, caller: Caller, period: Period) -> DeskResult<ReportDocument>;
}

/// Staff directory use cases
#[async_trait]
pub trait UserUseCases: Send + Sync {
    async fn list_users(&self, caller: Caller) -> DeskResult<Vec<UserSummary>>;

    async fn get_user(&self, caller: Caller, user_id: &UserId) -> DeskResult<UserSummary>;

    async fn create_user(&self, caller: Caller, command: CreateUserCommand) -> DeskResult<UserSummary>;

    async fn delete_user(&self, caller: Caller, user_id: &str) -> DeskResult<()>;

    /// Record activity for presence; never fails the caller's request
    async fn touch(&self, user_id: &UserId);
}

/// Login and request authentication
#[async_trait]
pub trait AuthUseCases: Send + Sync {
    /// `Ok(None)` on bad credentials
    async fn login(&self, command: LoginCommand) -> DeskResult<Option<LoginResponse>>;

    /// Resolve a bearer token to a live caller; `Ok(None)` if the token is
    /// bad or the user is gone
    async fn authenticate(&self, token: &str) -> DeskResult<Option<Caller>>;
}
