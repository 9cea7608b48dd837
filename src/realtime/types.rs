use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::audit::audit_models::AuditEvent;
use crate::notification::Notification;

/// Server-to-client frames. Everything here is a latency optimization for
/// connected sessions; the persisted notification row stays authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Notification(NotificationPayload),
    UnreadCount(UnreadCountPayload),
    AuditRecorded(AuditRecordedPayload),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationPayload {
    pub id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action_url: Option<String>,
    pub created_at: String,
}

impl From<&Notification> for NotificationPayload {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            notification_type: notification.notification_type.clone(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            priority: notification.priority.clone(),
            entity_type: notification.entity_type.clone(),
            entity_id: notification.entity_id,
            action_url: notification.action_url.clone(),
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountPayload {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditRecordedPayload {
    pub event_id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub created_at: String,
}

impl From<&AuditEvent> for AuditRecordedPayload {
    fn from(event: &AuditEvent) -> Self {
        Self {
            event_id: event.id,
            actor_id: event.actor_id,
            action: event.action.clone(),
            entity_type: event.entity_type.clone(),
            entity_id: event.entity_id,
            created_at: event.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorPayload {
    pub message: String,
}

// Client-to-server messages
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    MarkRead { notification_id: Uuid },
    MarkAllRead,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_message_is_tagged_snake_case() {
        let frame = WsMessage::UnreadCount(UnreadCountPayload { count: 3 });
        let encoded = serde_json::to_string(&frame).unwrap();

        assert!(encoded.contains("\"type\":\"unread_count\""));
        assert!(encoded.contains("\"count\":3"));
    }

    #[test]
    fn test_client_message_parses() {
        let id = Uuid::new_v4();
        let parsed: ClientMessage = serde_json::from_str(&format!(
            "{{\"type\":\"mark_read\",\"notification_id\":\"{}\"}}",
            id
        ))
        .unwrap();

        match parsed {
            ClientMessage::MarkRead { notification_id } => assert_eq!(notification_id, id),
            _ => panic!("expected mark_read"),
        }

        let parsed: ClientMessage = serde_json::from_str("{\"type\":\"mark_all_read\"}").unwrap();
        assert!(matches!(parsed, ClientMessage::MarkAllRead));
    }
}
