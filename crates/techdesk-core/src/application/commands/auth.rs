//! Login and bearer-token authentication

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

use crate::application::dto::{LoginCommand, LoginResponse, UserSummary};
use crate::domain::services::Caller;
use crate::error::DeskResult;
use crate::ports::inbound::AuthUseCases;
use crate::ports::outbound::{AuthError, AuthProvider, Clock, UserRepository};

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,
    online_window: Duration,
}

impl AuthService {
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
}

#[async_trait]
impl AuthUseCases for AuthService {
    async fn login(&self, command: LoginCommand) -> DeskResult<Option<LoginResponse>> {
        let Some(mut user) = self.auth.verify_credentials(&command.login, &command.password).await? else {
            tracing::info!(login = %command.login, "login rejected");
            return Ok(None);
        };

        let tokens = self.auth.issue_tokens(user.id(), user.role())?;
        let now = self.clock.now();
        self.users.update_last_seen(user.id(), now).await?;
        user.touch(now);

        tracing::info!(user_id = %user.id(), role = %user.role(), "login");
        Ok(Some(LoginResponse {
            tokens,
            user: UserSummary::from_user(&user, now, self.online_window),
        }))
    }

    async fn authenticate(&self, token: &str) -> DeskResult<Option<Caller>> {
        let claims = match self.auth.verify_token(token) {
            Ok(claims) => claims,
            Err(AuthError::InvalidToken | AuthError::Expired) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(user) = self.users.find_by_id(&claims.user_id).await? else {
            tracing::debug!(user_id = %claims.user_id, "token for deleted user");
            return Ok(None);
        };

        if let Err(e) = self.users.update_last_seen(user.id(), self.clock.now()).await {
            tracing::warn!(user_id = %user.id(), error = %e, "failed to record last seen");
        }
        Ok(Some(Caller::new(*user.id(), user.role())))
    }
}
