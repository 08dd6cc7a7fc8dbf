//! JWT authentication and argon2 password hashing

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::TokenPair;
use crate::config::AuthConfig;
use crate::domain::aggregates::User;
use crate::domain::value_objects::{Role, UserId};
use crate::ports::outbound::{AuthClaims, AuthError, AuthProvider, UserRepository};

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    /// Absent on refresh tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub typ: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &[u8]) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password, &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Provider(e.to_string()))
}

pub fn verify_password(password: &[u8], hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Provider(e.to_string()))?;
    match Argon2::default().verify_password(password, &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Provider(e.to_string())),
    }
}

/// HS256 tokens signed with the configured secret
pub struct JwtAuthProvider {
    users: Arc<dyn UserRepository>,
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtAuthProvider {
    pub fn new(users: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            users,
            config,
            encoding,
            decoding,
        }
    }

    fn sign(&self, user_id: &UserId, role: Option<Role>, typ: &str, ttl_secs: u64) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: *user_id.as_uuid(),
            role,
            typ: typ.to_string(),
            iss: self.config.issuer.clone(),
            iat,
            exp: iat + ttl_secs as i64,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| AuthError::Provider(e.to_string()))
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[self.config.issuer.as_str()]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            })
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        hash_password(password.as_bytes())
    }

    async fn verify_credentials(&self, login: &str, password: &str) -> Result<Option<User>, AuthError> {
        let login = login.trim();
        let by_name = self
            .users
            .find_by_name(login)
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        let user = match by_name {
            Some(user) => Some(user),
            None => self
                .users
                .find_by_email(&login.to_lowercase())
                .await
                .map_err(|e| AuthError::Provider(e.to_string()))?,
        };

        let Some(user) = user else {
            return Ok(None);
        };
        if verify_password(password.as_bytes(), user.password_hash())? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    fn issue_tokens(&self, user_id: &UserId, role: Role) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, Some(role), ACCESS, self.config.access_ttl_secs)?,
            refresh_token: self.sign(user_id, None, REFRESH, self.config.refresh_ttl_secs)?,
        })
    }

    fn verify_token(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let claims = self.decode(token)?;
        match (claims.typ.as_str(), claims.role) {
            (ACCESS, Some(role)) => Ok(AuthClaims {
                user_id: UserId::from_uuid(claims.sub),
                role,
            }),
            _ => Err(AuthError::InvalidToken),
        }
    }
}
