//! Bearer authentication

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use techdesk_core::domain::services::Caller;

use crate::error::ApiError;
use crate::AppState;

/// Caller resolved from `Authorization: Bearer <token>`.
///
/// Resolving also records the caller as seen.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCaller(pub Caller);

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn resolve_caller(state: &AppState, token: &str) -> Result<Caller, ApiError> {
    state
        .auth
        .authenticate(token)
        .await?
        .ok_or(ApiError::Unauthorized("invalid or expired token"))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized("missing bearer token"))?;
        resolve_caller(state, token).await.map(Self)
    }
}
