use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::gateway::connection::{ConnectionHandle, ConnectionId};

/// Who is online: display name -> live connection.
///
/// First registration of a name wins; later registrations of the same name
/// are ignored until the owning connection is removed. A reverse index keeps
/// removal by connection O(1).
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    by_name: DashMap<String, ConnectionHandle>,
    by_connection: DashMap<ConnectionId, String>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` for `handle`. Returns `false` when the name is already
    /// held (by this or another connection).
    pub fn register(&self, name: &str, handle: &ConnectionHandle) -> bool {
        match self.by_name.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                // Still holding the name's shard lock, so a concurrent remove
                // cannot observe the forward entry without the reverse one.
                self.by_connection.insert(handle.id(), name.to_string());
                slot.insert(handle.clone());
                true
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<ConnectionHandle> {
        self.by_name.get(name).map(|h| h.value().clone())
    }

    pub fn is_online(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Drop whatever entry `connection` owns. Returns the name it held.
    pub fn remove(&self, connection: ConnectionId) -> Option<String> {
        let (_, name) = self.by_connection.remove(&connection)?;
        self.by_name
            .remove_if(&name, |_, handle| handle.id() == connection);
        Some(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn online_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle(id: u64) -> ConnectionHandle {
        let (tx, _rx) = mpsc::channel(1);
        ConnectionHandle::new(ConnectionId::new(id), tx)
    }

    #[test]
    fn test_unregistered_name_is_absent() {
        let registry = PresenceRegistry::new();
        assert!(registry.lookup("nobody").is_none());
        assert!(!registry.is_online("nobody"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = PresenceRegistry::new();
        assert!(registry.register("alice", &handle(1)));
        assert!(!registry.register("alice", &handle(2)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("alice").unwrap().id(), ConnectionId::new(1));
    }

    #[test]
    fn test_repeat_identify_from_same_connection_is_noop() {
        let registry = PresenceRegistry::new();
        let h = handle(1);
        assert!(registry.register("alice", &h));
        assert!(!registry.register("alice", &h));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_clears_every_lookup() {
        let registry = PresenceRegistry::new();
        registry.register("alice", &handle(1));
        registry.register("bob", &handle(2));

        assert_eq!(registry.remove(ConnectionId::new(1)), Some("alice".to_string()));
        assert!(registry.lookup("alice").is_none());
        assert_eq!(registry.lookup("bob").unwrap().id(), ConnectionId::new(2));
        for name in registry.online_names() {
            assert_ne!(registry.lookup(&name).unwrap().id(), ConnectionId::new(1));
        }
    }

    #[test]
    fn test_remove_unknown_connection_is_noop() {
        let registry = PresenceRegistry::new();
        registry.register("alice", &handle(1));
        assert_eq!(registry.remove(ConnectionId::new(99)), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_loser_removal_keeps_winner() {
        let registry = PresenceRegistry::new();
        registry.register("alice", &handle(1));
        registry.register("alice", &handle(2));
        assert_eq!(registry.remove(ConnectionId::new(2)), None);
        assert_eq!(registry.lookup("alice").unwrap().id(), ConnectionId::new(1));
    }

    #[test]
    fn test_name_free_again_after_remove() {
        let registry = PresenceRegistry::new();
        registry.register("alice", &handle(1));
        registry.remove(ConnectionId::new(1));
        assert!(registry.register("alice", &handle(3)));
        assert_eq!(registry.lookup("alice").unwrap().id(), ConnectionId::new(3));
    }

    #[test]
    fn test_online_names_sorted() {
        let registry = PresenceRegistry::new();
        registry.register("carol", &handle(3));
        registry.register("alice", &handle(1));
        registry.register("bob", &handle(2));
        assert_eq!(registry.online_names(), vec!["alice", "bob", "carol"]);
    }
}
