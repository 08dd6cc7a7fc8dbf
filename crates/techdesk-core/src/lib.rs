//! TechDesk Core - Helpdesk ticket lifecycle
//!
//! Field-service helpdesk where managers raise work orders and technicians
//! claim and complete them.
//!
//! ## Architecture
//!
//! - **Domain Layer**: `Ticket` and `User` aggregates, the ticket state
//!   machine, the permission table and role-scoped visibility rules
//! - **Application Layer**: `TicketService` / `UserService` orchestrating
//!   repositories, authorization and notification hand-off
//! - **Ports Layer**: traits for persistence, auth, reporting, transport and time
//! - **Infrastructure Layer**: in-memory repositories, JWT/argon2 auth,
//!   connection registry and broadcaster, text reports
//!
//! ## Lifecycle
//!
//! ```text
//!   New ──accept──▶ InProgress ──complete──▶ Completed
//!    │                  ▲
//!  assign               │ accept (designated technician only)
//!    ▼                  │
//!   Assigned ───────────┘
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::{AuthService, TicketService, UserService};
pub use config::DeskConfig;
pub use domain::aggregates::{Ticket, TicketStatus, User};
pub use domain::value_objects::{Period, Priority, Role, TicketId, UserId};
pub use error::{DeskError, DeskResult};
