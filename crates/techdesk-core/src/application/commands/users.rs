//! User directory service

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

use crate::application::dto::{CreateUserCommand, UserSummary};
use crate::config::BootstrapAdmin;
use crate::domain::aggregates::User;
use crate::domain::services::{authorize, Action, Caller};
use crate::domain::value_objects::{Role, UserId};
use crate::error::{DeskError, DeskResult};
use crate::ports::inbound::UserUseCases;
use crate::ports::outbound::{AuthProvider, Clock, UserRepository};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,
    online_window: Duration,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        auth: Arc<dyn AuthProvider>,
        clock: Arc<dyn Clock>,
        online_window: Duration,
    ) -> Self {
        Self {
            users,
            auth,
            clock,
            online_window,
        }
    }

    fn summary(&self, user: &User) -> UserSummary {
        UserSummary::from_user(user, self.clock.now(), self.online_window)
    }

    async fn register(&self, command: CreateUserCommand) -> DeskResult<User> {
        let email = command.email.trim().to_lowercase();
        let name = command.name.trim().to_string();

        if email.is_empty() || !email.contains('@') {
            return Err(DeskError::Validation(format!("invalid email: {:?}", command.email)));
        }
        if name.is_empty() {
            return Err(DeskError::Validation("name must not be blank".into()));
        }
        if command.password.is_empty() {
            return Err(DeskError::Validation("password must not be empty".into()));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DeskError::Validation(format!("email already registered: {email}")));
        }
        // Checked again under the repository's write lock on insert.
        if self.users.find_by_name(&name).await?.is_some() {
            return Err(DeskError::Validation(format!("name already taken: {name}")));
        }

        let hash = self.auth.hash_password(&command.password)?;
        let user = User::create(email, name, command.role, hash, self.clock.now());
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id(), role = %user.role(), "user created");
        Ok(user)
    }

    /// Create the configured administrator unless its email is already taken.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> DeskResult<bool> {
        let email = admin.email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        self.register(CreateUserCommand {
            email,
            password: admin.password.clone(),
            name: admin.name.clone(),
            role: Role::Admin,
        })
        .await?;
        Ok(true)
    }
}

#[async_trait]
impl UserUseCases for UserService {
    async fn list_users(&self, caller: Caller) -> DeskResult<Vec<UserSummary>> {
        authorize(caller.role, Action::ListUsers)?;
        let mut users: Vec<UserSummary> = self.users.list().await?.iter().map(|u| self.summary(u)).collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn get_user(&self, caller: Caller, user_id: &UserId) -> DeskResult<UserSummary> {
        authorize(caller.role, Action::ListUsers)?;
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| self.summary(&u))
            .ok_or_else(|| DeskError::NotFound(format!("user {user_id}")))
    }

    async fn create_user(&self, caller: Caller, command: CreateUserCommand) -> DeskResult<UserSummary> {
        authorize(caller.role, Action::CreateUser)?;
        let user = self.register(command).await?;
        Ok(self.summary(&user))
    }

    async fn delete_user(&self, caller: Caller, user_id: &str) -> DeskResult<()> {
        authorize(caller.role, Action::DeleteUser)?;
        let id = UserId::parse(user_id)?;

        if !self.users.delete(&id).await? {
            return Err(DeskError::NotFound(format!("user {id}")));
        }
        tracing::info!(user_id = %id, deleted_by = %caller.user_id, "user deleted");
        Ok(())
    }

    async fn touch(&self, user_id: &UserId) {
        if let Err(e) = self.users.update_last_seen(user_id, self.clock.now()).await {
            tracing::warn!(%user_id, error = %e, "failed to record last seen");
        }
    }
}
