use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    realtime::StreamEvent,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    Json,
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use uuid::Uuid;
use validator::Validate;

use super::notification_dto::{
    CreateNotificationRequest, MarkAllReadResponse, NotificationListQuery, NotificationPage,
    UnreadCountResponse, UpdatePreferencesRequest,
};
use super::notification_models::{Notification, NotificationPreference};
use super::notification_repository::NewNotification;

/// Page through the authenticated user's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Page of notifications", body = NotificationPage),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<NotificationPage>> {
    query.validate()?;

    let (notifications, has_more) = state
        .notification_repository
        .find_page(auth.id, &query.into())
        .await?;

    Ok(Json(NotificationPage {
        notifications,
        has_more,
    }))
}

/// Count of unread, unarchived notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn get_unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UnreadCountResponse>> {
    let count = state.notification_repository.unread_count(auth.id).await?;

    Ok(Json(UnreadCountResponse { count }))
}

/// Create a notification directly (administrative sends)
#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>)> {
    if auth.role != crate::user::UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    payload.validate()?;

    let created = state
        .notification_repository
        .create(&NewNotification::from(payload))
        .await?;

    // Same best-effort push path the fan-out uses.
    state.fanout.push_created(&created).await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Subscribe to real-time notifications via Server-Sent Events
#[utoipa::path(
    get,
    path = "/api/notifications/stream",
    responses(
        (status = 200, description = "SSE stream of notifications"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn notification_stream(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let user_id = auth.id;
    let rx = state.stream_tx.subscribe();

    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(move |event| {
        let event: Option<StreamEvent> = event.ok();
        async move {
            match event {
                Some(event) if event.recipient_id == user_id => {
                    Some(Ok(Event::default().data(event.payload)))
                }
                _ => None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Mark one notification as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>> {
    let notification = state
        .notification_repository
        .mark_as_read(notification_id, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

/// Mark every unread notification as read
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Number of notifications updated", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MarkAllReadResponse>> {
    let updated = state
        .notification_repository
        .mark_all_as_read(auth.id)
        .await?;

    Ok(Json(MarkAllReadResponse { updated }))
}

/// Archive a notification
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/archive",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification archived", body = Notification),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn archive_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>> {
    let notification = state
        .notification_repository
        .archive(notification_id, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode> {
    let deleted = state
        .notification_repository
        .delete(notification_id, auth.id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Current notification preferences (defaults when never saved)
#[utoipa::path(
    get,
    path = "/api/notifications/preferences",
    responses(
        (status = 200, description = "Notification preferences", body = NotificationPreference),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn get_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<NotificationPreference>> {
    let preference = state.preference_filter.preferences_for(auth.id).await?;

    Ok(Json(preference))
}

/// Update notification preferences
#[utoipa::path(
    put,
    path = "/api/notifications/preferences",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Preferences updated", body = NotificationPreference),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdatePreferencesRequest>,
) -> Result<Json<NotificationPreference>> {
    let preference = state
        .preference_repository
        .upsert(
            auth.id,
            payload.channel_preferences.as_ref(),
            payload.type_preferences.as_ref(),
        )
        .await?;

    Ok(Json(preference))
}
