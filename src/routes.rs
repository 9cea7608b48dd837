use crate::{
    audit::{audit_dto::RecordEventRequest, audit_handlers, AuditAction, AuditEvent, EntityKind},
    error::Result,
    middleware::{admin_authorization, auth_middleware},
    notification::{
        notification_dto::{
            CreateNotificationRequest, MarkAllReadResponse, NotificationPage, UnreadCountResponse,
            UpdatePreferencesRequest,
        },
        notification_handlers, Notification, NotificationChannel, NotificationPreference,
        NotificationPriority, NotificationType,
    },
    realtime,
    state::AppState,
    user::{user_handlers, User, UserRole},
};
use axum::{
    extract::State,
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        notification_handlers::get_notifications,
        notification_handlers::get_unread_count,
        notification_handlers::create_notification,
        notification_handlers::notification_stream,
        notification_handlers::mark_notification_read,
        notification_handlers::mark_all_read,
        notification_handlers::archive_notification,
        notification_handlers::delete_notification,
        notification_handlers::get_preferences,
        notification_handlers::update_preferences,
        audit_handlers::record_event,
        audit_handlers::list_events,
        user_handlers::list_users,
    ),
    components(
        schemas(
            Notification,
            NotificationPreference,
            NotificationType,
            NotificationPriority,
            NotificationChannel,
            NotificationPage,
            UnreadCountResponse,
            MarkAllReadResponse,
            UpdatePreferencesRequest,
            CreateNotificationRequest,
            AuditEvent,
            AuditAction,
            EntityKind,
            RecordEventRequest,
            User,
            UserRole,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "notifications", description = "Notification lifecycle endpoints"),
        (name = "audit", description = "Audit event ingestion and review"),
        (name = "users", description = "Directory lookups")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

/// Liveness probe, checks database connectivity
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(json!({ "status": "ok" })))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Protected routes (auth required)
    let notification_routes = Router::new()
        .route(
            "/",
            get(notification_handlers::get_notifications)
                .post(notification_handlers::create_notification),
        )
        .route("/unread-count", get(notification_handlers::get_unread_count))
        .route("/stream", get(notification_handlers::notification_stream))
        .route("/read-all", post(notification_handlers::mark_all_read))
        .route("/:id/read", patch(notification_handlers::mark_notification_read))
        .route(
            "/:id/archive",
            patch(notification_handlers::archive_notification),
        )
        .route("/:id", delete(notification_handlers::delete_notification))
        .route(
            "/preferences",
            get(notification_handlers::get_preferences)
                .put(notification_handlers::update_preferences),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Admin-only audit surface
    let audit_routes = Router::new()
        .route(
            "/events",
            post(audit_handlers::record_event).get(audit_handlers::list_events),
        )
        .route_layer(middleware::from_fn(admin_authorization))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let user_routes = Router::new()
        .route("/", get(user_handlers::list_users))
        .route_layer(middleware::from_fn(admin_authorization))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let ws_routes = Router::new()
        .route("/ws", get(realtime::ws_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    let api_routes = Router::new()
        .nest("/notifications", notification_routes)
        .nest("/audit", audit_routes)
        .nest("/users", user_routes)
        .merge(ws_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state)
}
