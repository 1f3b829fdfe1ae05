// ============================
// huddle-backend-lib/src/registry.rs
// ============================
//! Connection registry: maps each live transport connection to at most one
//! room membership. Entries exist only for the lifetime of the connection.
use dashmap::DashMap;
use huddle_common::{ConnectionId, ServerEvent};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Per-connection registry record. Holding the current room here (rather
/// than in transport-task state) lets the disconnect path look it up
/// without relying on closure lifetime.
pub struct ConnectionEntry {
    room: Option<String>,
    sender: UnboundedSender<ServerEvent>,
}

/// Registry of all live connections
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Allocate an id for a freshly accepted connection.
    pub fn register(&self, sender: UnboundedSender<ServerEvent>) -> ConnectionId {
        let id = Uuid::new_v4();
        self.connections
            .insert(id, ConnectionEntry { room: None, sender });
        id
    }

    /// Bind the connection to a room. Re-binding to the same room is
    /// idempotent; a connection already bound to a *different* room keeps
    /// its binding and the call reports failure.
    pub fn bind_to_room(&self, conn: ConnectionId, room_id: &str) -> bool {
        match self.connections.get_mut(&conn) {
            Some(mut entry) => match entry.room.as_deref() {
                Some(current) if current != room_id => false,
                _ => {
                    entry.room = Some(room_id.to_string());
                    true
                }
            },
            None => false,
        }
    }

    /// Release the room binding, returning the room it was bound to.
    pub fn unbind(&self, conn: ConnectionId) -> Option<String> {
        self.connections
            .get_mut(&conn)
            .and_then(|mut entry| entry.room.take())
    }

    /// The room this connection is currently joined to, if any.
    pub fn current_room(&self, conn: ConnectionId) -> Option<String> {
        self.connections
            .get(&conn)
            .and_then(|entry| entry.room.clone())
    }

    /// Drop the connection entirely. Returns the room that was still bound,
    /// if any, so the caller can run the leave sequence exactly once.
    pub fn deregister(&self, conn: ConnectionId) -> Option<String> {
        self.connections
            .remove(&conn)
            .and_then(|(_, entry)| entry.room)
    }

    /// Outbound channel of a connection, for point-to-point delivery.
    pub fn sender_of(&self, conn: ConnectionId) -> Option<UnboundedSender<ServerEvent>> {
        self.connections.get(&conn).map(|entry| entry.sender.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn registry_with_connection() -> (ConnectionRegistry, ConnectionId) {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = registry.register(tx);
        (registry, conn)
    }

    #[test]
    fn fresh_connection_has_no_room() {
        let (registry, conn) = registry_with_connection();
        assert_eq!(registry.current_room(conn), None);
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn bind_and_rebind_same_room_succeed() {
        let (registry, conn) = registry_with_connection();
        assert!(registry.bind_to_room(conn, "ABC123"));
        assert!(registry.bind_to_room(conn, "ABC123"));
        assert_eq!(registry.current_room(conn).as_deref(), Some("ABC123"));
    }

    #[test]
    fn bind_to_second_room_is_refused() {
        let (registry, conn) = registry_with_connection();
        assert!(registry.bind_to_room(conn, "ABC123"));
        assert!(!registry.bind_to_room(conn, "XYZ789"));
        assert_eq!(registry.current_room(conn).as_deref(), Some("ABC123"));
    }

    #[test]
    fn unbind_returns_previous_room_once() {
        let (registry, conn) = registry_with_connection();
        registry.bind_to_room(conn, "ABC123");
        assert_eq!(registry.unbind(conn).as_deref(), Some("ABC123"));
        assert_eq!(registry.unbind(conn), None);
        // re-joinable after returning to the unjoined state
        assert!(registry.bind_to_room(conn, "XYZ789"));
    }

    #[test]
    fn deregister_reports_still_bound_room() {
        let (registry, conn) = registry_with_connection();
        registry.bind_to_room(conn, "ABC123");
        assert_eq!(registry.deregister(conn).as_deref(), Some("ABC123"));
        assert_eq!(registry.connection_count(), 0);
        assert!(registry.sender_of(conn).is_none());
    }

    #[test]
    fn deregister_after_explicit_leave_reports_nothing() {
        let (registry, conn) = registry_with_connection();
        registry.bind_to_room(conn, "ABC123");
        registry.unbind(conn);
        assert_eq!(registry.deregister(conn), None);
    }

    #[test]
    fn operations_on_unknown_connection_are_noops() {
        let (registry, _conn) = registry_with_connection();
        let ghost = Uuid::new_v4();
        assert!(!registry.bind_to_room(ghost, "ABC123"));
        assert_eq!(registry.unbind(ghost), None);
        assert!(registry.sender_of(ghost).is_none());
    }
}
