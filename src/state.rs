use crate::audit::AuditService;
use crate::db::DbPool;
use crate::notification::{
    FanoutService, NotificationRepository, PreferenceFilter, PreferenceRepository,
};
use crate::realtime::{ConnectionManager, RealtimeDispatcher, StreamEvent};
use crate::user::UserRepository;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub connections: ConnectionManager,
    pub stream_tx: broadcast::Sender<StreamEvent>,
    pub user_repository: UserRepository,
    pub notification_repository: NotificationRepository,
    pub preference_repository: PreferenceRepository,
    pub preference_filter: PreferenceFilter,
    pub dispatcher: RealtimeDispatcher,
    pub fanout: FanoutService,
    pub audit_service: AuditService,
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
        }
    }
}
