use tokio::sync::broadcast;
use uuid::Uuid;

use crate::audit::audit_models::AuditEvent;
use crate::notification::Notification;
use crate::user::UserRole;

use super::connection::ConnectionManager;
use super::types::{AuditRecordedPayload, NotificationPayload, UnreadCountPayload, WsMessage};

/// One frame on the SSE fan-out channel, pre-serialized and addressed so
/// each subscriber can filter down to its own user.
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub recipient_id: Uuid,
    pub payload: String,
}

/// Best-effort push layer over the connection registry and the SSE broadcast
/// channel. Every method is fire-and-forget: with nobody connected a push is
/// a logged no-op, and no failure here ever reaches a caller.
#[derive(Clone)]
pub struct RealtimeDispatcher {
    connections: ConnectionManager,
    stream_tx: broadcast::Sender<StreamEvent>,
}

impl RealtimeDispatcher {
    pub fn new(connections: ConnectionManager, stream_tx: broadcast::Sender<StreamEvent>) -> Self {
        Self {
            connections,
            stream_tx,
        }
    }

    pub fn push_notification(&self, notification: &Notification) {
        let message = WsMessage::Notification(NotificationPayload::from(notification));

        if !self
            .connections
            .send_to_user(&notification.recipient_id, message.clone())
        {
            tracing::debug!(
                recipient = %notification.recipient_id,
                "recipient not connected, realtime push skipped"
            );
        }

        self.publish_stream(notification.recipient_id, &message);
    }

    pub fn push_unread_count(&self, user_id: Uuid, count: i64) {
        let message = WsMessage::UnreadCount(UnreadCountPayload { count });

        self.connections.send_to_user(&user_id, message.clone());
        self.publish_stream(user_id, &message);
    }

    /// Live audit feed for connected sessions of a role.
    pub fn push_audit_recorded(&self, role: UserRole, event: &AuditEvent) {
        let message = WsMessage::AuditRecorded(AuditRecordedPayload::from(event));
        let delivered = self.connections.send_to_role(role, message);

        if delivered == 0 {
            tracing::debug!(role = %role, "no connected sessions for role, push skipped");
        }
    }

    fn publish_stream(&self, recipient_id: Uuid, message: &WsMessage) {
        if let Ok(payload) = serde_json::to_string(message) {
            // Errors only mean there is no SSE subscriber right now.
            let _ = self.stream_tx.send(StreamEvent {
                recipient_id,
                payload,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn notification(recipient_id: Uuid) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id,
            recipient_role: "HR".to_string(),
            notification_type: "JOB_CREATED".to_string(),
            title: "New job posted".to_string(),
            message: "Job 'Backend Engineer' was posted".to_string(),
            entity_type: "JOB".to_string(),
            entity_id: Uuid::new_v4(),
            metadata: json!({}),
            is_read: false,
            is_archived: false,
            priority: "MEDIUM".to_string(),
            action_url: None,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_push_without_connections_is_a_noop() {
        let (stream_tx, _) = broadcast::channel(8);
        let dispatcher = RealtimeDispatcher::new(ConnectionManager::new(), stream_tx);

        // Nothing registered anywhere; must not panic or error.
        dispatcher.push_notification(&notification(Uuid::new_v4()));
        dispatcher.push_unread_count(Uuid::new_v4(), 5);
    }

    #[tokio::test]
    async fn test_push_notification_reaches_sse_subscribers() {
        let (stream_tx, mut stream_rx) = broadcast::channel(8);
        let dispatcher = RealtimeDispatcher::new(ConnectionManager::new(), stream_tx);
        let recipient = Uuid::new_v4();

        dispatcher.push_notification(&notification(recipient));

        let event = stream_rx.recv().await.unwrap();
        assert_eq!(event.recipient_id, recipient);
        assert!(event.payload.contains("\"type\":\"notification\""));
        assert!(event.payload.contains("JOB_CREATED"));
    }
}
