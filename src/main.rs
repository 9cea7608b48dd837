mod audit;
mod db;
mod error;
mod middleware;
mod notification;
mod realtime;
mod routes;
mod state;
mod user;

use audit::{AuditRepository, AuditService};
use db::{create_pool, run_migrations};
use notification::{
    start_cleanup_service, FanoutService, NotificationRepository, PreferenceFilter,
    PreferenceRepository, RecipientResolver,
};
use realtime::{ConnectionManager, RealtimeDispatcher};
use routes::create_router;
use state::{AppState, Config};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user::UserRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hireflow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    tracing::info!("Connecting to database...");
    let db = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Realtime plumbing: connection registry plus the SSE broadcast channel
    let connections = ConnectionManager::new();
    let (stream_tx, _) = broadcast::channel(100);
    let dispatcher = RealtimeDispatcher::new(connections.clone(), stream_tx.clone());

    // Create repositories
    let user_repository = UserRepository::new(db.clone());
    let notification_repository = NotificationRepository::new(db.clone());
    let preference_repository = PreferenceRepository::new(db.clone());
    let audit_repository = AuditRepository::new(db.clone());

    // Create services
    let preference_filter = PreferenceFilter::new(preference_repository.clone());
    let resolver = RecipientResolver::new(Arc::new(user_repository.clone()));
    let fanout = FanoutService::new(
        resolver,
        preference_filter.clone(),
        notification_repository.clone(),
        dispatcher.clone(),
    );
    let audit_service = AuditService::new(audit_repository, fanout.clone(), dispatcher.clone());

    // Create application state
    let state = AppState {
        db,
        config,
        connections,
        stream_tx,
        user_repository,
        notification_repository,
        preference_repository,
        preference_filter,
        dispatcher,
        fanout,
        audit_service,
    };

    // Start the expiry sweep
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_cleanup_service(cleanup_state).await {
            tracing::error!("Notification cleanup service error: {:?}", e);
        }
    });

    // Create router
    let app = create_router(state);

    // Start server
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
