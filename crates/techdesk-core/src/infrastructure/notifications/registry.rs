//! Live connection registry

use dashmap::DashMap;
use std::collections::HashSet;

use crate::domain::value_objects::{ConnectionId, UserId};

/// Map of user to the connections they currently hold open.
///
/// A user may hold several connections; an entry disappears with its last one.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, user_id: UserId) -> ConnectionId {
        let connection = ConnectionId::new();
        self.connections.entry(user_id).or_default().insert(connection);
        tracing::debug!(%user_id, %connection, "connection registered");
        connection
    }

    /// Returns whether the connection was known
    pub fn unregister(&self, user_id: &UserId, connection: &ConnectionId) -> bool {
        let removed = match self.connections.get_mut(user_id) {
            Some(mut set) => set.remove(connection),
            None => return false,
        };
        self.connections.remove_if(user_id, |_, set| set.is_empty());
        if removed {
            tracing::debug!(%user_id, %connection, "connection unregistered");
        }
        removed
    }

    /// Point-in-time copy; later registrations are not included
    pub fn connections_for(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.connections
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_connected(&self, user_id: &UserId) -> bool {
        self.connections.contains_key(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_connections_per_user() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new();
        let a = registry.register(user);
        let b = registry.register(user);
        assert_ne!(a, b);
        assert_eq!(registry.connections_for(&user).len(), 2);

        assert!(registry.unregister(&user, &a));
        assert!(registry.is_connected(&user));
        assert!(registry.unregister(&user, &b));
        assert!(!registry.is_connected(&user));
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new();
        assert!(!registry.unregister(&user, &ConnectionId::new()));
        registry.register(user);
        assert!(!registry.unregister(&user, &ConnectionId::new()));
        assert_eq!(registry.connection_count(), 1);
    }
}
