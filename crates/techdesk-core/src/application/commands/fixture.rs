//! Wired-up services over in-memory adapters for service tests

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::application::commands::{AuthService, TicketService, UserService};
use crate::application::dto::TicketNotification;
use crate::config::{AuthConfig, PresenceConfig};
use crate::domain::aggregates::User;
use crate::domain::services::Caller;
use crate::domain::value_objects::{Role, UserId};
use crate::infrastructure::{
    InMemoryTicketRepository, InMemoryUserRepository, JwtAuthProvider, ManualClock, TextReportGenerator,
};
use crate::ports::outbound::{NotificationSink, UserRepository};

/// Keeps every notification instead of delivering it
#[derive(Default)]
pub struct CapturingSink {
    sent: Mutex<Vec<TicketNotification>>,
}

impl CapturingSink {
    pub fn events(&self) -> Vec<TicketNotification> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl NotificationSink for CapturingSink {
    fn enqueue(&self, notification: TicketNotification) {
        self.sent.lock().push(notification);
    }
}

pub struct Desk {
    pub tickets: Arc<TicketService>,
    pub users: Arc<UserService>,
    pub auth: Arc<AuthService>,
    pub provider: Arc<JwtAuthProvider>,
    pub user_repo: Arc<InMemoryUserRepository>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<CapturingSink>,
}

impl Desk {
    pub async fn new() -> Self {
        let sink = Arc::new(CapturingSink::default());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()));
        let user_repo = Arc::new(InMemoryUserRepository::new());
        let ticket_repo = Arc::new(InMemoryTicketRepository::new());
        let provider = Arc::new(JwtAuthProvider::new(user_repo.clone(), AuthConfig::default()));
        let window = PresenceConfig::default().online_window();

        let tickets = Arc::new(TicketService::new(
            ticket_repo,
            user_repo.clone(),
            sink.clone(),
            Arc::new(TextReportGenerator::new()),
            clock.clone(),
        ));
        let users = Arc::new(UserService::new(user_repo.clone(), provider.clone(), clock.clone(), window));
        let auth = Arc::new(AuthService::new(user_repo.clone(), provider.clone(), clock.clone(), window));

        Self {
            tickets,
            users,
            auth,
            provider,
            user_repo,
            clock,
            sink,
        }
    }

    /// Insert a user directly, skipping password hashing
    pub async fn user(&self, name: &str, role: Role) -> Caller {
        let user = User::create(
            format!("{name}@techdesk.local"),
            name,
            role,
            "!".into(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        );
        self.user_repo.insert(&user).await.unwrap();
        Caller::new(*user.id(), role)
    }

    pub async fn remove_user(&self, id: &UserId) {
        assert!(self.user_repo.delete(id).await.unwrap());
    }
}
