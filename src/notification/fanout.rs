//! Turns one mutation event into N persisted notifications plus best-effort
//! pushes. `handle` is the producer-facing entry point and never fails: every
//! degraded path collapses to "fewer or zero notifications for this event".

use crate::audit::audit_models::MutationEvent;
use crate::error::Result;
use crate::realtime::RealtimeDispatcher;

use super::notification_models::{Notification, NotificationChannel};
use super::notification_repository::NotificationRepository;
use super::preferences::PreferenceFilter;
use super::recipients::RecipientResolver;
use super::templates;

#[derive(Clone)]
pub struct FanoutService {
    resolver: RecipientResolver,
    preferences: PreferenceFilter,
    notifications: NotificationRepository,
    dispatcher: RealtimeDispatcher,
}

impl FanoutService {
    pub fn new(
        resolver: RecipientResolver,
        preferences: PreferenceFilter,
        notifications: NotificationRepository,
        dispatcher: RealtimeDispatcher,
    ) -> Self {
        Self {
            resolver,
            preferences,
            notifications,
            dispatcher,
        }
    }

    pub async fn handle(&self, event: MutationEvent) {
        match self.fan_out(&event).await {
            Ok(0) => {}
            Ok(created) => tracing::info!(
                entity = %event.entity_kind,
                action = %event.action,
                created,
                "notification fan-out complete"
            ),
            Err(e) => tracing::error!(
                entity = %event.entity_kind,
                action = %event.action,
                "notification fan-out failed, event dropped: {:?}",
                e
            ),
        }
    }

    async fn fan_out(&self, event: &MutationEvent) -> Result<usize> {
        let Some(draft) = templates::map(event) else {
            return Ok(0);
        };

        let recipients = match self.resolver.resolve(&draft.recipients).await {
            Ok(recipients) => recipients,
            Err(e) => {
                // All-or-nothing resolution: a directory failure means zero
                // recipients for this event, not an error.
                tracing::warn!(
                    notification_type = %draft.notification_type,
                    "recipient resolution failed, treating as zero recipients: {:?}",
                    e
                );
                return Ok(0);
            }
        };

        if recipients.is_empty() {
            tracing::debug!(
                notification_type = %draft.notification_type,
                "event resolved to zero recipients"
            );
            return Ok(0);
        }

        // Creation-time type gate, applied per recipient. Lookup failures
        // fail open: absence of a readable preference means enabled.
        let mut enabled = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            match self
                .preferences
                .is_type_enabled(recipient.user_id, draft.notification_type)
                .await
            {
                Ok(true) => enabled.push(recipient),
                Ok(false) => tracing::debug!(
                    user = %recipient.user_id,
                    notification_type = %draft.notification_type,
                    "notification type muted by preference"
                ),
                Err(e) => {
                    tracing::warn!(
                        user = %recipient.user_id,
                        "preference lookup failed, delivering anyway: {:?}",
                        e
                    );
                    enabled.push(recipient);
                }
            }
        }

        if enabled.is_empty() {
            return Ok(0);
        }

        // The write always precedes the push. A crash after the commit loses
        // pushes only, never records.
        let created = self
            .notifications
            .create_for_recipients(&enabled, &draft)
            .await?;

        for notification in &created {
            self.push_created(notification).await;
        }

        Ok(created.len())
    }

    /// Realtime delivery for one freshly persisted record, gated by the
    /// recipient's in-app channel preference.
    pub async fn push_created(&self, notification: &Notification) {
        let realtime_enabled = self
            .preferences
            .is_channel_enabled(notification.recipient_id, NotificationChannel::InApp)
            .await
            .unwrap_or(true);

        if !realtime_enabled {
            tracing::debug!(
                recipient = %notification.recipient_id,
                "in-app channel muted, realtime push skipped"
            );
            return;
        }

        self.dispatcher.push_notification(notification);

        match self
            .notifications
            .unread_count(notification.recipient_id)
            .await
        {
            Ok(count) => self
                .dispatcher
                .push_unread_count(notification.recipient_id, count),
            Err(e) => tracing::debug!(
                recipient = %notification.recipient_id,
                "unread count push skipped: {:?}",
                e
            ),
        }
    }
}
