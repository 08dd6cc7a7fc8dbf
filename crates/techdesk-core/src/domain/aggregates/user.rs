//! User entity
use chrono::{DateTime, Duration, Utc};

use crate::domain::value_objects::{Role, UserId};

#[derive(Clone, Debug)]
pub struct User {
    id: UserId,
    email: String,
    name: String,
    role: Role,
    password_hash: String,
    created_at: DateTime<Utc>,
    last_seen: Option<DateTime<Utc>>,
}

impl User {
    pub fn create(
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            name: name.into(),
            role,
            password_hash,
            created_at: now,
            last_seen: None,
        }
    }

    pub fn id(&self) -> &UserId { &self.id }
    pub fn email(&self) -> &str { &self.email }
    pub fn name(&self) -> &str { &self.name }
    pub fn role(&self) -> Role { self.role }
    pub fn password_hash(&self) -> &str { &self.password_hash }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn last_seen(&self) -> Option<DateTime<Utc>> { self.last_seen }

    /// Seen within `window` of `now`. Derived on read, never stored.
    pub fn is_online(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.last_seen {
            Some(seen) => {
                let elapsed = now - seen;
                elapsed >= Duration::zero() && elapsed <= window
            }
            None => false,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = Some(now);
    }
}
