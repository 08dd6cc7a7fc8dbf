//! Domain services module

pub mod authorization;
pub mod visibility;

pub use authorization::{authorize, is_permitted, Action, PERMISSIONS};
pub use visibility::{interested_parties, references_resolve, Caller, TicketQuery};
