use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::user_models::{User, UserRole};

/// Directory lookup used to expand role broadcasts into concrete users.
/// Membership is read live, so a broadcast reflects the roster at delivery
/// time rather than at event time.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn active_user_ids_with_role(&self, role: UserRole) -> Result<Vec<Uuid>>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = $1 AND is_active = true ORDER BY created_at",
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn active_user_ids_with_role(&self, role: UserRole) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE role = $1 AND is_active = true ORDER BY created_at",
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
