use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    UserSignup,
    UserRoleChange,
    UserRemoved,
    JobCreated,
    JobStatusChange,
    JobDeleted,
    CandidateAdded,
    CandidateStageChange,
    CandidateAssigned,
    CompanyAdded,
    InterviewScheduled,
    InterviewRescheduled,
    InterviewCancelled,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::UserSignup => "USER_SIGNUP",
            NotificationType::UserRoleChange => "USER_ROLE_CHANGE",
            NotificationType::UserRemoved => "USER_REMOVED",
            NotificationType::JobCreated => "JOB_CREATED",
            NotificationType::JobStatusChange => "JOB_STATUS_CHANGE",
            NotificationType::JobDeleted => "JOB_DELETED",
            NotificationType::CandidateAdded => "CANDIDATE_ADDED",
            NotificationType::CandidateStageChange => "CANDIDATE_STAGE_CHANGE",
            NotificationType::CandidateAssigned => "CANDIDATE_ASSIGNED",
            NotificationType::CompanyAdded => "COMPANY_ADDED",
            NotificationType::InterviewScheduled => "INTERVIEW_SCHEDULED",
            NotificationType::InterviewRescheduled => "INTERVIEW_RESCHEDULED",
            NotificationType::InterviewCancelled => "INTERVIEW_CANCELLED",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "LOW",
            NotificationPriority::Medium => "MEDIUM",
            NotificationPriority::High => "HIGH",
        }
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery channels a user can opt out of independently. `InApp` covers the
/// realtime push to connected sessions; the durable record itself is only
/// gated by the per-type preference. `Email` and `Push` are decision seams
/// for external senders, no transport is wired here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    InApp,
    Email,
    Push,
}

impl NotificationChannel {
    pub const ALL: [NotificationChannel; 3] = [
        NotificationChannel::InApp,
        NotificationChannel::Email,
        NotificationChannel::Push,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::InApp => "in_app",
            NotificationChannel::Email => "email",
            NotificationChannel::Push => "push",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_role: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub is_read: bool,
    pub is_archived: bool,
    pub priority: String,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationPreference {
    pub user_id: Uuid,
    #[schema(value_type = Object)]
    pub channel_preferences: Value,
    #[schema(value_type = Object)]
    pub type_preferences: Value,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    /// All channels and types enabled, which is what a user without a stored
    /// row gets.
    pub fn default_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            channel_preferences: Value::Object(serde_json::Map::new()),
            type_preferences: Value::Object(serde_json::Map::new()),
            updated_at: Utc::now(),
        }
    }

    /// A channel is enabled unless explicitly switched off.
    pub fn is_channel_enabled(&self, channel: NotificationChannel) -> bool {
        self.channel_preferences
            .get(channel.as_str())
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// A notification type is enabled unless explicitly switched off.
    pub fn is_type_enabled(&self, notification_type: NotificationType) -> bool {
        self.type_preferences
            .get(notification_type.as_str())
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_type_display() {
        assert_eq!(NotificationType::UserSignup.to_string(), "USER_SIGNUP");
        assert_eq!(
            NotificationType::JobStatusChange.to_string(),
            "JOB_STATUS_CHANGE"
        );
        assert_eq!(
            NotificationType::InterviewCancelled.to_string(),
            "INTERVIEW_CANCELLED"
        );
    }

    #[test]
    fn test_notification_type_serde_matches_as_str() {
        for ty in [
            NotificationType::UserSignup,
            NotificationType::CandidateAssigned,
            NotificationType::CompanyAdded,
        ] {
            let encoded = serde_json::to_string(&ty).unwrap();
            assert_eq!(encoded, format!("\"{}\"", ty.as_str()));
        }
    }

    #[test]
    fn test_default_preference_enables_everything() {
        let preference = NotificationPreference::default_for(Uuid::new_v4());

        for channel in NotificationChannel::ALL {
            assert!(preference.is_channel_enabled(channel));
        }
        assert!(preference.is_type_enabled(NotificationType::UserSignup));
        assert!(preference.is_type_enabled(NotificationType::JobStatusChange));
    }

    #[test]
    fn test_channel_opt_outs_are_independent() {
        let mut preference = NotificationPreference::default_for(Uuid::new_v4());
        preference.channel_preferences = json!({ "email": false });

        assert!(!preference.is_channel_enabled(NotificationChannel::Email));
        assert!(preference.is_channel_enabled(NotificationChannel::InApp));
        assert!(preference.is_channel_enabled(NotificationChannel::Push));
    }

    #[test]
    fn test_type_opt_out_only_disables_that_type() {
        let mut preference = NotificationPreference::default_for(Uuid::new_v4());
        preference.type_preferences = json!({ "JOB_STATUS_CHANGE": false });

        assert!(!preference.is_type_enabled(NotificationType::JobStatusChange));
        assert!(preference.is_type_enabled(NotificationType::JobCreated));
    }

    #[test]
    fn test_mistyped_preference_value_reads_as_enabled() {
        let mut preference = NotificationPreference::default_for(Uuid::new_v4());
        preference.channel_preferences = json!({ "email": "off" });

        assert!(preference.is_channel_enabled(NotificationChannel::Email));
    }
}
