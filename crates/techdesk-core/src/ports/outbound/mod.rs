//! Outbound ports (Repository and provider traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::application::dto::{TicketNotification, TicketView, TokenPair};
use crate::domain::aggregates::{Ticket, User};
use crate::domain::services::TicketQuery;
use crate::domain::value_objects::{ConnectionId, Period, Role, TicketId, UserId};
use crate::error::DeskError;

/// User repository port
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Exact match on the lowercased address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Login name lookup
    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError>;

    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    /// Fails with `Conflict` when the email or the display name is taken
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;

    /// Returns whether a row was removed
    async fn delete(&self, id: &UserId) -> Result<bool, RepositoryError>;

    async fn update_last_seen(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), RepositoryError>;
}

/// Ticket repository port
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError>;

    /// Tickets matching `query`, in no particular order
    async fn list(&self, query: &TicketQuery) -> Result<Vec<Ticket>, RepositoryError>;

    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError>;

    /// Replace an existing row; `NotFound` if it vanished
    async fn update(&self, ticket: &Ticket) -> Result<(), RepositoryError>;
}

/// Repository error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Verified token contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthClaims {
    pub user_id: UserId,
    pub role: Role,
}

/// Credential checks and token handling
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(None)` means the login or password is wrong
    async fn verify_credentials(&self, login: &str, password: &str)
        -> Result<Option<User>, AuthError>;

    fn issue_tokens(&self, user_id: &UserId, role: Role) -> Result<TokenPair, AuthError>;

    /// Access tokens only; refresh tokens are rejected
    fn verify_token(&self, token: &str) -> Result<AuthClaims, AuthError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    Expired,

    #[error("auth provider failure: {0}")]
    Provider(String),
}

impl From<AuthError> for DeskError {
    fn from(err: AuthError) -> Self {
        DeskError::Dependency(err.to_string())
    }
}

/// Renders a list of tickets into a downloadable document
pub trait ReportGenerator: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn render(&self, tickets: &[TicketView], period: Period, generated_at: DateTime<Utc>)
        -> Result<Vec<u8>, ReportError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("report rendering failed: {0}")]
pub struct ReportError(pub String);

impl From<ReportError> for DeskError {
    fn from(err: ReportError) -> Self {
        DeskError::Dependency(err.to_string())
    }
}

/// Delivers one serialized payload to one live connection
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, connection: ConnectionId, payload: Arc<str>) -> Result<(), TransportError>;

    /// Tear down a connection the broadcaster has given up on. The peer has
    /// to reconnect to receive further notifications. Closing an unknown
    /// connection is a no-op.
    fn close(&self, connection: ConnectionId);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection {0} closed")]
    Closed(ConnectionId),

    #[error("send to {0} timed out")]
    Timeout(ConnectionId),

    #[error("transport failure: {0}")]
    Failed(String),
}

/// Where committed ticket changes are handed off for fan-out.
///
/// Must not block; the caller has already committed. Delivery is best-effort:
/// when the hand-off is full or shut down the notification is dropped and
/// logged, never retried, and the mutation still succeeds.
pub trait NotificationSink: Send + Sync {
    fn enqueue(&self, notification: TicketNotification);
}

/// Source of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
