use crate::error::Result;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::notification_models::{
    NotificationChannel, NotificationPreference, NotificationType,
};

#[derive(Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<NotificationPreference>> {
        let preference = sqlx::query_as::<_, NotificationPreference>(
            "SELECT * FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(preference)
    }

    /// Partial upsert: only the maps that are provided get replaced, the
    /// other one keeps its stored value.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        channel_preferences: Option<&Value>,
        type_preferences: Option<&Value>,
    ) -> Result<NotificationPreference> {
        let preference = sqlx::query_as::<_, NotificationPreference>(
            "INSERT INTO notification_preferences (user_id, channel_preferences, type_preferences)
             VALUES ($1, COALESCE($2, '{}'::jsonb), COALESCE($3, '{}'::jsonb))
             ON CONFLICT (user_id) DO UPDATE SET
                channel_preferences = COALESCE($2, notification_preferences.channel_preferences),
                type_preferences = COALESCE($3, notification_preferences.type_preferences),
                updated_at = NOW()
             RETURNING *",
        )
        .bind(user_id)
        .bind(channel_preferences)
        .bind(type_preferences)
        .fetch_one(&self.pool)
        .await?;

        Ok(preference)
    }
}

/// Per-user opt-out gating. The type gate runs at creation time and decides
/// whether a recipient gets a row at all; the channel gate runs per delivery
/// channel and never touches the durable record.
#[derive(Clone)]
pub struct PreferenceFilter {
    repository: PreferenceRepository,
}

impl PreferenceFilter {
    pub fn new(repository: PreferenceRepository) -> Self {
        Self { repository }
    }

    /// Stored preferences, or the all-enabled defaults when the user never
    /// saved any.
    pub async fn preferences_for(&self, user_id: Uuid) -> Result<NotificationPreference> {
        let preference = self
            .repository
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreference::default_for(user_id));

        Ok(preference)
    }

    pub async fn is_type_enabled(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
    ) -> Result<bool> {
        let preference = self.preferences_for(user_id).await?;
        Ok(preference.is_type_enabled(notification_type))
    }

    pub async fn is_channel_enabled(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
    ) -> Result<bool> {
        let preference = self.preferences_for(user_id).await?;
        Ok(preference.is_channel_enabled(channel))
    }

    /// Delivery decision for external channel senders: which channels this
    /// user still accepts. The senders themselves live elsewhere.
    pub async fn enabled_channels(&self, user_id: Uuid) -> Result<Vec<NotificationChannel>> {
        let preference = self.preferences_for(user_id).await?;
        Ok(NotificationChannel::ALL
            .into_iter()
            .filter(|channel| preference.is_channel_enabled(*channel))
            .collect())
    }
}
