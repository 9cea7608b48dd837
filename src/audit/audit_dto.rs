use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::audit_models::{AuditAction, EntityKind, MutationEvent};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordEventRequest {
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    #[schema(value_type = Option<Object>)]
    pub before: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub after: Option<Value>,
    #[serde(default = "default_metadata")]
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub occurred_at: Option<DateTime<Utc>>,
}

fn default_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}

impl From<RecordEventRequest> for MutationEvent {
    fn from(request: RecordEventRequest) -> Self {
        MutationEvent {
            actor_id: request.actor_id,
            action: request.action,
            entity_kind: request.entity_type,
            entity_id: request.entity_id,
            before: request.before,
            after: request.after,
            metadata: request.metadata,
            occurred_at: request.occurred_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct AuditListQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
    pub action: Option<AuditAction>,
    pub entity_type: Option<EntityKind>,
    pub actor_id: Option<Uuid>,
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_request_defaults() {
        let request: RecordEventRequest = serde_json::from_value(json!({
            "actor_id": Uuid::new_v4(),
            "action": "CREATE",
            "entity_type": "USER",
            "entity_id": Uuid::new_v4(),
        }))
        .unwrap();

        assert!(request.metadata.is_object());
        assert!(request.occurred_at.is_none());

        let event = MutationEvent::from(request);
        assert_eq!(event.action, AuditAction::Create);
        assert_eq!(event.entity_kind, EntityKind::User);
    }

    #[test]
    fn test_list_query_defaults() {
        let query: AuditListQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 0);
        assert!(query.action.is_none());
    }
}
