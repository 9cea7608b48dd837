use crate::{error::Result, state::AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::user_models::{User, UserRole};

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListQuery {
    pub role: UserRole,
}

/// List active users holding a role (the directory view the resolver uses)
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Active users with the role", body = Vec<User>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<User>>> {
    let users = state.user_repository.find_active_by_role(query.role).await?;

    Ok(Json(users))
}
