//! Aggregates
pub mod ticket;
pub mod user;
pub use ticket::{NewTicket, Ticket, TicketError, TicketStatus, MAX_PHOTOS};
pub use user::User;
