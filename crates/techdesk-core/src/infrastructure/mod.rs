//! Infrastructure layer
//!
//! Adapters behind the outbound ports.

pub mod auth;
pub mod clock;
pub mod notifications;
pub mod persistence;
pub mod reporting;

pub use auth::JwtAuthProvider;
pub use clock::{ManualClock, SystemClock};
pub use notifications::{Broadcaster, ConnectionRegistry, DeliveryReport, NotificationQueue};
pub use persistence::{InMemoryTicketRepository, InMemoryUserRepository};
pub use reporting::TextReportGenerator;
