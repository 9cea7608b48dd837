use crate::error::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::notification_models::{Notification, NotificationPriority, NotificationType};
use super::recipients::ConcreteRecipient;
use super::templates::NotificationDraft;
use crate::audit::audit_models::EntityKind;
use crate::user::UserRole;

/// Insert payload for one notification row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub recipient_role: UserRole,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub metadata: Value,
    pub priority: NotificationPriority,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Page query options for a user's notification list.
#[derive(Debug, Clone)]
pub struct NotificationPageQuery {
    pub limit: i64,
    pub offset: i64,
    pub include_archived: bool,
    pub notification_type: Option<NotificationType>,
}

const INSERT_SQL: &str =
    "INSERT INTO notifications (recipient_id, recipient_role, notification_type, title, message,
                                entity_type, entity_id, metadata, priority, action_url, expires_at)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
     RETURNING *";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &NewNotification) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(INSERT_SQL)
            .bind(data.recipient_id)
            .bind(data.recipient_role.as_str())
            .bind(data.notification_type.as_str())
            .bind(&data.title)
            .bind(&data.message)
            .bind(data.entity_type.as_str())
            .bind(data.entity_id)
            .bind(&data.metadata)
            .bind(data.priority.as_str())
            .bind(data.action_url.as_deref())
            .bind(data.expires_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(notification)
    }

    /// Fan-out insert: one independent row per recipient, committed together
    /// so all recipients of an event are durable before any push fires.
    pub async fn create_for_recipients(
        &self,
        recipients: &[ConcreteRecipient],
        draft: &NotificationDraft,
    ) -> Result<Vec<Notification>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(recipients.len());

        for recipient in recipients {
            let notification = sqlx::query_as::<_, Notification>(INSERT_SQL)
                .bind(recipient.user_id)
                .bind(recipient.role.as_str())
                .bind(draft.notification_type.as_str())
                .bind(&draft.title)
                .bind(&draft.message)
                .bind(draft.entity_type.as_str())
                .bind(draft.entity_id)
                .bind(&draft.metadata)
                .bind(draft.priority.as_str())
                .bind(draft.action_url.as_deref())
                .bind(draft.expires_at)
                .fetch_one(&mut *tx)
                .await?;

            created.push(notification);
        }

        tx.commit().await?;

        Ok(created)
    }

    /// Newest-first page. Fetches one row beyond the limit so the caller
    /// learns whether more pages exist without a second count query.
    pub async fn find_page(
        &self,
        user_id: Uuid,
        options: &NotificationPageQuery,
    ) -> Result<(Vec<Notification>, bool)> {
        let mut query = "SELECT * FROM notifications WHERE recipient_id = $1".to_string();
        let mut params_count = 1;

        if !options.include_archived {
            query.push_str(" AND is_archived = false");
        }

        if options.notification_type.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND notification_type = ${}", params_count));
        }

        query.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            params_count + 1,
            params_count + 2
        ));

        let mut db_query = sqlx::query_as::<_, Notification>(&query).bind(user_id);

        if let Some(notification_type) = options.notification_type {
            db_query = db_query.bind(notification_type.as_str());
        }

        let mut notifications = db_query
            .bind(options.limit + 1)
            .bind(options.offset)
            .fetch_all(&self.pool)
            .await?;

        let has_more = notifications.len() as i64 > options.limit;
        notifications.truncate(options.limit as usize);

        Ok((notifications, has_more))
    }

    /// Archived-but-unread rows do not count.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications
             WHERE recipient_id = $1 AND is_read = false AND is_archived = false",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn mark_as_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = true
             WHERE id = $1 AND recipient_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Idempotent: a second call finds nothing unread and reports 0.
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true
             WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn archive(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_archived = true
             WHERE id = $1 AND recipient_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Expiry sweep across all users. Rows past their `expires_at` stay
    /// visible until this runs; read paths never filter on expiry.
    pub async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < NOW()",
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
