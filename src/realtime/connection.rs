use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::user::UserRole;

use super::types::WsMessage;

pub type WsSender = mpsc::UnboundedSender<WsMessage>;

struct ConnectionEntry {
    sender: WsSender,
    role: UserRole,
}

/// Registry of currently-connected WebSocket sessions, addressable per user
/// and per role.
#[derive(Clone)]
pub struct ConnectionManager {
    connections: Arc<DashMap<Uuid, ConnectionEntry>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
        }
    }

    pub fn add_connection(&self, user_id: Uuid, role: UserRole, sender: WsSender) {
        self.connections
            .insert(user_id, ConnectionEntry { sender, role });
        tracing::info!("User {} connected via WebSocket", user_id);
    }

    pub fn remove_connection(&self, user_id: &Uuid) {
        self.connections.remove(user_id);
        tracing::info!("User {} disconnected from WebSocket", user_id);
    }

    /// Send to one user's session. Returns false when the user has no active
    /// connection or the session is gone.
    pub fn send_to_user(&self, user_id: &Uuid, message: WsMessage) -> bool {
        if let Some(entry) = self.connections.get(user_id) {
            entry.sender.send(message).is_ok()
        } else {
            false
        }
    }

    /// Send to every connected session whose user holds the role. Returns the
    /// number of sessions reached.
    pub fn send_to_role(&self, role: UserRole, message: WsMessage) -> usize {
        let mut delivered = 0;
        for entry in self.connections.iter() {
            if entry.value().role == role && entry.value().sender.send(message.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn is_user_online(&self, user_id: &Uuid) -> bool {
        self.connections.contains_key(user_id)
    }

    pub fn online_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::types::UnreadCountPayload;

    fn frame(count: i64) -> WsMessage {
        WsMessage::UnreadCount(UnreadCountPayload { count })
    }

    #[tokio::test]
    async fn test_send_to_user_reaches_registered_session() {
        let manager = ConnectionManager::new();
        let user = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();

        manager.add_connection(user, UserRole::Hr, tx);
        assert!(manager.send_to_user(&user, frame(1)));
        assert!(matches!(
            rx.recv().await,
            Some(WsMessage::UnreadCount(UnreadCountPayload { count: 1 }))
        ));
    }

    #[tokio::test]
    async fn test_send_to_unknown_user_is_a_noop() {
        let manager = ConnectionManager::new();
        assert!(!manager.send_to_user(&Uuid::new_v4(), frame(1)));
    }

    #[tokio::test]
    async fn test_send_to_role_only_reaches_that_role() {
        let manager = ConnectionManager::new();
        let (admin_tx, mut admin_rx) = mpsc::unbounded_channel();
        let (agent_tx, mut agent_rx) = mpsc::unbounded_channel();

        manager.add_connection(Uuid::new_v4(), UserRole::Admin, admin_tx);
        manager.add_connection(Uuid::new_v4(), UserRole::Agent, agent_tx);

        let delivered = manager.send_to_role(UserRole::Admin, frame(7));
        assert_eq!(delivered, 1);
        assert!(admin_rx.recv().await.is_some());
        assert!(agent_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_removed_connection_is_unreachable() {
        let manager = ConnectionManager::new();
        let user = Uuid::new_v4();
        let (tx, _rx) = mpsc::unbounded_channel();

        manager.add_connection(user, UserRole::Hr, tx);
        assert!(manager.is_user_online(&user));

        manager.remove_connection(&user);
        assert!(!manager.is_user_online(&user));
        assert!(!manager.send_to_user(&user, frame(1)));
        assert_eq!(manager.online_count(), 0);
    }
}
