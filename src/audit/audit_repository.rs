use crate::error::Result;
use sqlx::PgPool;

use super::audit_dto::AuditListQuery;
use super::audit_models::{AuditEvent, MutationEvent};

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, event: &MutationEvent) -> Result<AuditEvent> {
        let row = sqlx::query_as::<_, AuditEvent>(
            "INSERT INTO audit_events (actor_id, action, entity_type, entity_id, before_state, after_state, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(event.actor_id)
        .bind(event.action.as_str())
        .bind(event.entity_kind.as_str())
        .bind(event.entity_id)
        .bind(event.before.as_ref())
        .bind(event.after.as_ref())
        .bind(&event.metadata)
        .bind(event.occurred_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_all(&self, filters: &AuditListQuery) -> Result<Vec<AuditEvent>> {
        let mut query = "SELECT * FROM audit_events WHERE 1 = 1".to_string();
        let mut params_count = 0;

        if filters.action.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND action = ${}", params_count));
        }

        if filters.entity_type.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND entity_type = ${}", params_count));
        }

        if filters.actor_id.is_some() {
            params_count += 1;
            query.push_str(&format!(" AND actor_id = ${}", params_count));
        }

        query.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            params_count + 1,
            params_count + 2
        ));

        let mut db_query = sqlx::query_as::<_, AuditEvent>(&query);

        if let Some(action) = filters.action {
            db_query = db_query.bind(action.as_str());
        }

        if let Some(entity_type) = filters.entity_type {
            db_query = db_query.bind(entity_type.as_str());
        }

        if let Some(actor_id) = filters.actor_id {
            db_query = db_query.bind(actor_id);
        }

        let events = db_query
            .bind(filters.limit)
            .bind(filters.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }
}
