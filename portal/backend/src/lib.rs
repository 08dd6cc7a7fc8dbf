//! TechDesk Portal
//!
//! Axum HTTP API and WebSocket feed in front of the helpdesk core.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use techdesk_core::infrastructure::{
    Broadcaster, ConnectionRegistry, InMemoryTicketRepository, InMemoryUserRepository, JwtAuthProvider,
    NotificationQueue, SystemClock, TextReportGenerator,
};
use techdesk_core::ports::inbound::{AuthUseCases, TicketUseCases, UserUseCases};
use techdesk_core::ports::outbound::{Clock, UserRepository};
use techdesk_core::{AuthService, DeskConfig, DeskResult, TicketService, UserService};

pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ws;

use ws::WsTransport;

#[derive(Clone)]
pub struct AppState {
    pub tickets: Arc<dyn TicketUseCases>,
    pub users: Arc<dyn UserUseCases>,
    pub auth: Arc<dyn AuthUseCases>,
    pub registry: Arc<ConnectionRegistry>,
    pub sockets: Arc<WsTransport>,
}

impl AppState {
    /// Wire the in-memory adapters, start the notification dispatcher and
    /// seed the configured administrator.
    pub async fn bootstrap(config: &DeskConfig) -> DeskResult<(Self, JoinHandle<()>)> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let user_repo: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let ticket_repo = Arc::new(InMemoryTicketRepository::new());
        let provider = Arc::new(JwtAuthProvider::new(user_repo.clone(), config.auth.clone()));
        let online_window = config.presence.online_window();

        let registry = Arc::new(ConnectionRegistry::new());
        let sockets = Arc::new(WsTransport::new());
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            sockets.clone(),
            config.notifications.send_timeout(),
        ));
        let (queue, dispatcher) = NotificationQueue::start(broadcaster, config.notifications.queue_capacity);

        let users = Arc::new(UserService::new(
            user_repo.clone(),
            provider.clone(),
            clock.clone(),
            online_window,
        ));
        if let Some(admin) = &config.bootstrap_admin {
            if users.ensure_admin(admin).await? {
                tracing::info!(email = %admin.email, "bootstrap admin created");
            }
        }

        let tickets = Arc::new(TicketService::new(
            ticket_repo,
            user_repo.clone(),
            Arc::new(queue),
            Arc::new(TextReportGenerator::new()),
            clock.clone(),
        ));
        let auth = Arc::new(AuthService::new(user_repo, provider, clock, online_window));

        let state = Self {
            tickets,
            users,
            auth,
            registry,
            sockets,
        };
        Ok((state, dispatcher))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))

        // Auth
        .route("/auth/login", post(handlers::login))

        // Tickets
        .route("/tickets", get(handlers::list_tickets).post(handlers::create_ticket))
        .route("/tickets/export", get(handlers::export_report))
        .route("/tickets/:id", get(handlers::get_ticket))
        .route("/tickets/:id/accept", put(handlers::accept_ticket))
        .route("/tickets/:id/assign", put(handlers::assign_ticket))
        .route("/tickets/:id/complete", put(handlers::complete_ticket))

        // Users
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route("/users/me", get(handlers::me))
        .route("/users/:id", delete(handlers::delete_user))

        // WebSocket
        .route("/ws", get(ws::ws_handler))

        .fallback(handlers::fallback)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
