use crate::error::Result;
use crate::notification::FanoutService;
use crate::realtime::RealtimeDispatcher;
use crate::user::UserRole;

use super::audit_dto::AuditListQuery;
use super::audit_models::{AuditEvent, MutationEvent};
use super::audit_repository::AuditRepository;

/// Ingress of the pipeline: persists mutation events and detaches the
/// notification fan-out so producers never fail or block on it.
#[derive(Clone)]
pub struct AuditService {
    repository: AuditRepository,
    fanout: FanoutService,
    dispatcher: RealtimeDispatcher,
}

impl AuditService {
    pub fn new(
        repository: AuditRepository,
        fanout: FanoutService,
        dispatcher: RealtimeDispatcher,
    ) -> Self {
        Self {
            repository,
            fanout,
            dispatcher,
        }
    }

    /// Stores the event (storage errors propagate to the producer, who owns
    /// the audit trail) and spawns fan-out on its own task. Each event gets
    /// an independent task, so distinct events run fully in parallel with no
    /// ordering between them.
    pub async fn record(&self, event: MutationEvent) -> Result<AuditEvent> {
        let stored = self.repository.create(&event).await?;

        tracing::debug!(
            entity = %event.entity_kind,
            action = %event.action,
            entity_id = %event.entity_id,
            "audit event recorded"
        );

        // Live feed for connected admin sessions, best-effort.
        self.dispatcher
            .push_audit_recorded(UserRole::Admin, &stored);

        let fanout = self.fanout.clone();
        tokio::spawn(async move {
            fanout.handle(event).await;
        });

        Ok(stored)
    }

    pub async fn list(&self, filters: &AuditListQuery) -> Result<Vec<AuditEvent>> {
        self.repository.find_all(filters).await
    }
}
