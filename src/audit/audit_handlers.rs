use crate::{error::Result, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::audit_dto::{AuditListQuery, RecordEventRequest};
use super::audit_models::{AuditEvent, MutationEvent};

/// Record a domain mutation event and trigger notification fan-out
#[utoipa::path(
    post,
    path = "/api/audit/events",
    request_body = RecordEventRequest,
    responses(
        (status = 201, description = "Event recorded", body = AuditEvent),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "audit",
    security(("bearer_auth" = []))
)]
pub async fn record_event(
    State(state): State<AppState>,
    Json(payload): Json<RecordEventRequest>,
) -> Result<(StatusCode, Json<AuditEvent>)> {
    let stored = state
        .audit_service
        .record(MutationEvent::from(payload))
        .await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

/// List recorded audit events, newest first
#[utoipa::path(
    get,
    path = "/api/audit/events",
    params(AuditListQuery),
    responses(
        (status = 200, description = "Audit events", body = Vec<AuditEvent>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "audit",
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<Vec<AuditEvent>>> {
    query.validate()?;

    let events = state.audit_service.list(&query).await?;

    Ok(Json(events))
}
