use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::audit::audit_models::EntityKind;
use crate::user::UserRole;

use super::notification_models::{Notification, NotificationPriority, NotificationType};
use super::notification_repository::{NewNotification, NotificationPageQuery};

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct NotificationListQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
    #[serde(default)]
    pub include_archived: bool,
    pub notification_type: Option<NotificationType>,
}

fn default_limit() -> i64 {
    20
}

impl From<NotificationListQuery> for NotificationPageQuery {
    fn from(query: NotificationListQuery) -> Self {
        NotificationPageQuery {
            limit: query.limit,
            offset: query.offset,
            include_archived: query.include_archived,
            notification_type: query.notification_type,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub has_more: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// Both maps are optional so a client can update one side without clobbering
/// the other.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePreferencesRequest {
    #[schema(value_type = Option<Object>)]
    pub channel_preferences: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub type_preferences: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    pub recipient_role: UserRole,
    pub notification_type: NotificationType,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    #[serde(default = "default_metadata")]
    #[schema(value_type = Object)]
    pub metadata: Value,
    #[serde(default = "default_priority")]
    pub priority: NotificationPriority,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_priority() -> NotificationPriority {
    NotificationPriority::Medium
}

impl From<CreateNotificationRequest> for NewNotification {
    fn from(request: CreateNotificationRequest) -> Self {
        NewNotification {
            recipient_id: request.recipient_id,
            recipient_role: request.recipient_role,
            notification_type: request.notification_type,
            title: request.title,
            message: request.message,
            entity_type: request.entity_type,
            entity_id: request.entity_id,
            metadata: request.metadata,
            priority: request.priority,
            action_url: request.action_url,
            expires_at: request.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_query_defaults() {
        let query: NotificationListQuery = serde_json::from_value(json!({})).unwrap();

        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 0);
        assert!(!query.include_archived);
        assert!(query.notification_type.is_none());
    }

    #[test]
    fn test_list_query_parses_type_filter() {
        let query: NotificationListQuery = serde_json::from_value(json!({
            "notification_type": "JOB_STATUS_CHANGE",
            "include_archived": true,
            "limit": 50,
        }))
        .unwrap();

        assert_eq!(
            query.notification_type,
            Some(NotificationType::JobStatusChange)
        );
        assert!(query.include_archived);
        assert_eq!(query.limit, 50);
    }

    #[test]
    fn test_list_query_rejects_out_of_range_limit() {
        let query: NotificationListQuery =
            serde_json::from_value(json!({ "limit": 500 })).unwrap();
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateNotificationRequest = serde_json::from_value(json!({
            "recipient_id": Uuid::new_v4(),
            "recipient_role": "HR",
            "notification_type": "CANDIDATE_ADDED",
            "title": "New candidate added",
            "message": "Jane Doe entered the pipeline",
            "entity_type": "CANDIDATE",
            "entity_id": Uuid::new_v4(),
        }))
        .unwrap();

        assert_eq!(request.priority, NotificationPriority::Medium);
        assert!(request.metadata.is_object());
        assert!(request.expires_at.is_none());

        let data = NewNotification::from(request);
        assert_eq!(data.recipient_role, UserRole::Hr);
        assert_eq!(data.notification_type, NotificationType::CandidateAdded);
    }
}
