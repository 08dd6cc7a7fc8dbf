//! In-memory repository implementations
//!
//! Every write happens under the map's write lock, so a single row update is
//! atomic and email and name uniqueness are checked and enforced in one step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::aggregates::{Ticket, User};
use crate::domain::services::TicketQuery;
use crate::domain::value_objects::{TicketId, UserId};
use crate::ports::outbound::{RepositoryError, TicketRepository, UserRepository};

/// In-memory user repository
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read();
        Ok(users.values().find(|u| u.email() == email).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read();
        Ok(users.values().find(|u| u.name() == name).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.users.read().values().cloned().collect())
    }

    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email() == user.email()) {
            return Err(RepositoryError::Conflict(format!(
                "email already registered: {}",
                user.email()
            )));
        }
        if users.values().any(|u| u.name() == user.name()) {
            return Err(RepositoryError::Conflict(format!("name already taken: {}", user.name())));
        }
        users.insert(*user.id(), user.clone());
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, RepositoryError> {
        Ok(self.users.write().remove(id).is_some())
    }

    async fn update_last_seen(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut users = self.users.write();
        let user = users
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))?;
        user.touch(at);
        Ok(())
    }
}

/// In-memory ticket repository
#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: RwLock<HashMap<TicketId, Ticket>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError> {
        Ok(self.tickets.read().get(id).cloned())
    }

    async fn list(&self, query: &TicketQuery) -> Result<Vec<Ticket>, RepositoryError> {
        let tickets = self.tickets.read();
        Ok(tickets.values().filter(|t| query.matches(t)).cloned().collect())
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        let mut tickets = self.tickets.write();
        if tickets.contains_key(ticket.id()) {
            return Err(RepositoryError::Conflict(format!("ticket {} exists", ticket.id())));
        }
        tickets.insert(*ticket.id(), ticket.clone());
        Ok(())
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        let mut tickets = self.tickets.write();
        match tickets.get_mut(ticket.id()) {
            Some(slot) => {
                *slot = ticket.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("ticket {}", ticket.id()))),
        }
    }
}
