//! Domain module
//!
//! Ticket lifecycle, user presence and the rules around them.

pub mod aggregates;
pub mod value_objects;
pub mod events;
pub mod services;

pub use aggregates::*;
pub use value_objects::*;
pub use events::*;
