//! Command handlers
//!
//! Application services that orchestrate use cases.

mod auth;
mod tickets;
mod users;

#[cfg(test)]
pub(crate) mod fixture;

pub use auth::AuthService;
pub use tickets::TicketService;
pub use users::UserService;
