//! Live ticket notifications
//!
//! Committed mutations are queued, then fanned out to every live connection
//! of each interested user. Delivery never feeds back into the mutation.

mod broadcaster;
mod queue;
mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcaster::{Broadcaster, DeliveryReport};
pub use queue::NotificationQueue;
pub use registry::ConnectionRegistry;
