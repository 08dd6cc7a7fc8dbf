//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod commands;
pub mod dto;

pub use commands::{AuthService, TicketService, UserService};
pub use dto::*;
