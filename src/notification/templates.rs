//! Maps domain mutation events to notification drafts.
//!
//! Dispatch is a lookup keyed on `(entity, action)`; each recognized pair has
//! its own template function that checks the event guard, picks a static type
//! and priority, and assembles recipients from role broadcasts plus ids
//! carried in the event metadata. Templates are total: an unrecognized pair,
//! an unmet guard, or missing metadata all yield `None`, never an error.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::audit::audit_models::{AuditAction, EntityKind, MutationEvent};
use crate::user::UserRole;

use super::notification_models::{NotificationPriority, NotificationType};
use super::recipients::RecipientSpec;

/// Ephemeral mapper output, fanned out into one row per resolved recipient.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub recipients: Vec<RecipientSpec>,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub metadata: Value,
    pub priority: NotificationPriority,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NotificationDraft {
    fn new(
        event: &MutationEvent,
        notification_type: NotificationType,
        priority: NotificationPriority,
        title: &str,
        message: String,
        recipients: Vec<RecipientSpec>,
    ) -> Self {
        Self {
            notification_type,
            title: title.to_string(),
            message,
            recipients,
            entity_type: event.entity_kind,
            entity_id: event.entity_id,
            metadata: event.metadata.clone(),
            priority,
            action_url: None,
            expires_at: None,
        }
    }

    fn with_action_url(mut self, url: String) -> Self {
        self.action_url = Some(url);
        self
    }

    /// Informational notifications age out instead of piling up forever.
    fn with_ttl(mut self, event: &MutationEvent, days: i64) -> Self {
        self.expires_at = Some(event.occurred_at + Duration::days(days));
        self
    }
}

type TemplateFn = fn(&MutationEvent) -> Option<NotificationDraft>;

pub fn map(event: &MutationEvent) -> Option<NotificationDraft> {
    match template_for(event.entity_kind, event.action) {
        Some(template) => template(event),
        None => {
            tracing::debug!(
                entity = %event.entity_kind,
                action = %event.action,
                "no notification template for event"
            );
            None
        }
    }
}

fn template_for(entity: EntityKind, action: AuditAction) -> Option<TemplateFn> {
    use AuditAction::*;
    use EntityKind::*;

    let template: TemplateFn = match (entity, action) {
        (User, Create) => user_created,
        (User, Update) => user_role_changed,
        (User, Delete) => user_removed,
        (Job, Create) => job_created,
        (Job, Update) => job_status_changed,
        (Job, Delete) => job_deleted,
        (Candidate, Create) => candidate_added,
        (Candidate, Update) => candidate_stage_changed,
        (Candidate, Assign) => candidate_assigned,
        (Company, Create) => company_added,
        (Interview, Create) => interview_scheduled,
        (Interview, Update) => interview_rescheduled,
        (Interview, Delete) => interview_cancelled,
        _ => return None,
    };

    Some(template)
}

fn admin_broadcast() -> RecipientSpec {
    RecipientSpec::Broadcast {
        role: UserRole::Admin,
    }
}

fn hr_directs(event: &MutationEvent) -> Vec<RecipientSpec> {
    event
        .metadata_ids("hrIds")
        .into_iter()
        .map(|id| RecipientSpec::Direct {
            id,
            role: UserRole::Hr,
        })
        .collect()
}

fn agent_directs(event: &MutationEvent) -> Vec<RecipientSpec> {
    event
        .metadata_ids("agentIds")
        .into_iter()
        .map(|id| RecipientSpec::Direct {
            id,
            role: UserRole::Agent,
        })
        .collect()
}

fn user_created(event: &MutationEvent) -> Option<NotificationDraft> {
    let who = event.after_str("email").unwrap_or("A new user");
    let message = match event.after_str("role") {
        Some(role) => format!("{} has signed up as {}", who, role),
        None => format!("{} has signed up", who),
    };

    Some(
        NotificationDraft::new(
            event,
            NotificationType::UserSignup,
            NotificationPriority::Medium,
            "New user registered",
            message,
            vec![admin_broadcast()],
        )
        .with_action_url(format!("/users/{}", event.entity_id)),
    )
}

fn user_role_changed(event: &MutationEvent) -> Option<NotificationDraft> {
    if !event.metadata_flag("roleChange") {
        return None;
    }

    let who = event
        .after_str("email")
        .or_else(|| event.metadata_str("email"))
        .unwrap_or("A user");
    let message = match (event.metadata_str("oldRole"), event.metadata_str("newRole")) {
        (Some(old), Some(new)) => format!("{} changed role from {} to {}", who, old, new),
        _ => format!("{} was given a new role", who),
    };

    let mut recipients = vec![admin_broadcast()];
    // The affected user hears about their own role change; skipped when the
    // new role cannot be read back out of the metadata.
    if let Some(role) = event.metadata_str("newRole").and_then(UserRole::parse) {
        recipients.push(RecipientSpec::Direct {
            id: event.entity_id,
            role,
        });
    }

    Some(
        NotificationDraft::new(
            event,
            NotificationType::UserRoleChange,
            NotificationPriority::High,
            "User role changed",
            message,
            recipients,
        )
        .with_action_url(format!("/users/{}", event.entity_id)),
    )
}

fn user_removed(event: &MutationEvent) -> Option<NotificationDraft> {
    let who = event
        .before_str("email")
        .or_else(|| event.metadata_str("email"))
        .unwrap_or("A user");

    Some(NotificationDraft::new(
        event,
        NotificationType::UserRemoved,
        NotificationPriority::Medium,
        "User removed",
        format!("{} was removed from the platform", who),
        vec![admin_broadcast()],
    ))
}

fn job_created(event: &MutationEvent) -> Option<NotificationDraft> {
    let title = event.after_str("title").unwrap_or("A new job");
    let message = match event.metadata_str("companyName") {
        Some(company) => format!("Job '{}' was posted for {}", title, company),
        None => format!("Job '{}' was posted", title),
    };

    let mut recipients = vec![admin_broadcast()];
    recipients.extend(hr_directs(event));

    Some(
        NotificationDraft::new(
            event,
            NotificationType::JobCreated,
            NotificationPriority::Medium,
            "New job posted",
            message,
            recipients,
        )
        .with_action_url(format!("/jobs/{}", event.entity_id)),
    )
}

fn job_status_changed(event: &MutationEvent) -> Option<NotificationDraft> {
    if !event.metadata_flag("statusChange") {
        return None;
    }

    let title = event
        .after_str("title")
        .or_else(|| event.metadata_str("jobTitle"))
        .unwrap_or("A job");
    let message = match (
        event.metadata_str("oldStatus"),
        event.metadata_str("newStatus"),
    ) {
        (Some(old), Some(new)) => format!("Job '{}' moved from {} to {}", title, old, new),
        _ => format!("Job '{}' changed status", title),
    };

    let mut recipients = vec![admin_broadcast()];
    recipients.extend(hr_directs(event));
    recipients.extend(agent_directs(event));

    Some(
        NotificationDraft::new(
            event,
            NotificationType::JobStatusChange,
            NotificationPriority::High,
            "Job status updated",
            message,
            recipients,
        )
        .with_action_url(format!("/jobs/{}", event.entity_id)),
    )
}

fn job_deleted(event: &MutationEvent) -> Option<NotificationDraft> {
    let title = event
        .before_str("title")
        .or_else(|| event.metadata_str("jobTitle"))
        .unwrap_or("A job");

    let mut recipients = vec![admin_broadcast()];
    recipients.extend(hr_directs(event));

    Some(NotificationDraft::new(
        event,
        NotificationType::JobDeleted,
        NotificationPriority::Medium,
        "Job deleted",
        format!("Job '{}' was deleted", title),
        recipients,
    ))
}

fn candidate_added(event: &MutationEvent) -> Option<NotificationDraft> {
    let name = event.after_str("fullName").unwrap_or("A new candidate");

    let mut recipients = vec![admin_broadcast()];
    recipients.extend(hr_directs(event));

    Some(
        NotificationDraft::new(
            event,
            NotificationType::CandidateAdded,
            NotificationPriority::Medium,
            "New candidate added",
            format!("{} entered the pipeline", name),
            recipients,
        )
        .with_action_url(format!("/candidates/{}", event.entity_id)),
    )
}

fn candidate_stage_changed(event: &MutationEvent) -> Option<NotificationDraft> {
    if !event.metadata_flag("stageChange") {
        return None;
    }

    let name = event
        .after_str("fullName")
        .or_else(|| event.metadata_str("candidateName"))
        .unwrap_or("A candidate");
    let message = match (
        event.metadata_str("oldStage"),
        event.metadata_str("newStage"),
    ) {
        (Some(old), Some(new)) => format!("{} moved from {} to {}", name, old, new),
        _ => format!("{} moved to a new stage", name),
    };

    let mut recipients = hr_directs(event);
    recipients.extend(agent_directs(event));

    Some(
        NotificationDraft::new(
            event,
            NotificationType::CandidateStageChange,
            NotificationPriority::Medium,
            "Candidate stage changed",
            message,
            recipients,
        )
        .with_action_url(format!("/candidates/{}", event.entity_id)),
    )
}

fn candidate_assigned(event: &MutationEvent) -> Option<NotificationDraft> {
    let name = event
        .after_str("fullName")
        .or_else(|| event.metadata_str("candidateName"))
        .unwrap_or("A candidate");

    let mut recipients = agent_directs(event);
    recipients.extend(hr_directs(event));

    Some(
        NotificationDraft::new(
            event,
            NotificationType::CandidateAssigned,
            NotificationPriority::High,
            "Candidate assigned",
            format!("{} was assigned for follow-up", name),
            recipients,
        )
        .with_action_url(format!("/candidates/{}", event.entity_id)),
    )
}

fn company_added(event: &MutationEvent) -> Option<NotificationDraft> {
    let name = event.after_str("name").unwrap_or("A new company");

    Some(
        NotificationDraft::new(
            event,
            NotificationType::CompanyAdded,
            NotificationPriority::Low,
            "Company added",
            format!("{} was added as a client", name),
            vec![admin_broadcast()],
        )
        .with_ttl(event, 90),
    )
}

fn interview_scheduled(event: &MutationEvent) -> Option<NotificationDraft> {
    let candidate = event.metadata_str("candidateName").unwrap_or("a candidate");
    let message = match event.metadata_str("scheduledAt") {
        Some(when) => format!("Interview with {} scheduled for {}", candidate, when),
        None => format!("Interview with {} was scheduled", candidate),
    };

    let mut recipients = hr_directs(event);
    recipients.extend(agent_directs(event));

    Some(
        NotificationDraft::new(
            event,
            NotificationType::InterviewScheduled,
            NotificationPriority::High,
            "Interview scheduled",
            message,
            recipients,
        )
        .with_action_url(format!("/interviews/{}", event.entity_id)),
    )
}

fn interview_rescheduled(event: &MutationEvent) -> Option<NotificationDraft> {
    if !event.metadata_flag("rescheduled") && !event.metadata_flag("statusChange") {
        return None;
    }

    let candidate = event.metadata_str("candidateName").unwrap_or("a candidate");
    let message = match event.metadata_str("scheduledAt") {
        Some(when) => format!("Interview with {} was moved to {}", candidate, when),
        None => format!("Interview with {} was updated", candidate),
    };

    let mut recipients = hr_directs(event);
    recipients.extend(agent_directs(event));

    Some(
        NotificationDraft::new(
            event,
            NotificationType::InterviewRescheduled,
            NotificationPriority::High,
            "Interview updated",
            message,
            recipients,
        )
        .with_action_url(format!("/interviews/{}", event.entity_id)),
    )
}

fn interview_cancelled(event: &MutationEvent) -> Option<NotificationDraft> {
    let candidate = event.metadata_str("candidateName").unwrap_or("a candidate");

    let mut recipients = hr_directs(event);
    recipients.extend(agent_directs(event));

    Some(NotificationDraft::new(
        event,
        NotificationType::InterviewCancelled,
        NotificationPriority::High,
        "Interview cancelled",
        format!("Interview with {} was cancelled", candidate),
        recipients,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(
        action: AuditAction,
        entity_kind: EntityKind,
        after: Option<Value>,
        metadata: Value,
    ) -> MutationEvent {
        MutationEvent {
            actor_id: Uuid::new_v4(),
            action,
            entity_kind,
            entity_id: Uuid::new_v4(),
            before: None,
            after,
            metadata,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_signup_notifies_all_admins() {
        let event = event(
            AuditAction::Create,
            EntityKind::User,
            Some(json!({ "email": "a@b.com", "role": "HR" })),
            json!({}),
        );

        let draft = map(&event).expect("signup should map");
        assert_eq!(draft.notification_type, NotificationType::UserSignup);
        assert_eq!(draft.priority, NotificationPriority::Medium);
        assert_eq!(
            draft.recipients,
            vec![RecipientSpec::Broadcast {
                role: UserRole::Admin
            }]
        );
        assert!(draft.message.contains("a@b.com"));
        assert!(draft.message.contains("HR"));
    }

    #[test]
    fn test_job_status_change_collects_admins_hr_and_agents() {
        let hr = Uuid::new_v4();
        let agent = Uuid::new_v4();
        let event = event(
            AuditAction::Update,
            EntityKind::Job,
            None,
            json!({
                "statusChange": true,
                "oldStatus": "draft",
                "newStatus": "published",
                "hrIds": [hr.to_string()],
                "agentIds": [agent.to_string()],
            }),
        );

        let draft = map(&event).expect("status change should map");
        assert_eq!(draft.notification_type, NotificationType::JobStatusChange);
        assert_eq!(draft.priority, NotificationPriority::High);
        assert_eq!(
            draft.recipients,
            vec![
                RecipientSpec::Broadcast {
                    role: UserRole::Admin
                },
                RecipientSpec::Direct {
                    id: hr,
                    role: UserRole::Hr
                },
                RecipientSpec::Direct {
                    id: agent,
                    role: UserRole::Agent
                },
            ]
        );
        assert!(draft.message.contains("draft"));
        assert!(draft.message.contains("published"));
    }

    #[test]
    fn test_user_update_without_role_change_maps_to_nothing() {
        let event = event(AuditAction::Update, EntityKind::User, None, json!({}));
        assert!(map(&event).is_none());
    }

    #[test]
    fn test_job_update_without_status_change_maps_to_nothing() {
        let event = event(
            AuditAction::Update,
            EntityKind::Job,
            None,
            json!({ "oldStatus": "draft", "newStatus": "published" }),
        );
        assert!(map(&event).is_none());
    }

    #[test]
    fn test_unrecognized_pairs_map_to_nothing() {
        for (entity_kind, action) in [
            (EntityKind::Company, AuditAction::Update),
            (EntityKind::Company, AuditAction::Delete),
            (EntityKind::User, AuditAction::Assign),
            (EntityKind::Job, AuditAction::Assign),
            (EntityKind::Interview, AuditAction::Assign),
        ] {
            let event = event(action, entity_kind, None, json!({}));
            assert!(
                map(&event).is_none(),
                "({:?}, {:?}) should not map",
                entity_kind,
                action
            );
        }
    }

    #[test]
    fn test_missing_snapshot_degrades_to_generic_message() {
        let event = event(AuditAction::Create, EntityKind::User, None, json!({}));

        let draft = map(&event).expect("signup maps even without a snapshot");
        assert!(draft.message.contains("A new user"));
        assert!(draft.action_url.is_some());
    }

    #[test]
    fn test_role_change_includes_affected_user_when_role_parses() {
        let event = event(
            AuditAction::Update,
            EntityKind::User,
            None,
            json!({ "roleChange": true, "oldRole": "AGENT", "newRole": "HR" }),
        );

        let draft = map(&event).expect("role change should map");
        assert_eq!(draft.notification_type, NotificationType::UserRoleChange);
        assert_eq!(draft.recipients.len(), 2);
        assert_eq!(
            draft.recipients[1],
            RecipientSpec::Direct {
                id: event.entity_id,
                role: UserRole::Hr
            }
        );
    }

    #[test]
    fn test_role_change_with_unknown_role_drops_the_direct_spec() {
        let event = event(
            AuditAction::Update,
            EntityKind::User,
            None,
            json!({ "roleChange": true, "newRole": "SUPERUSER" }),
        );

        let draft = map(&event).expect("role change should map");
        assert_eq!(
            draft.recipients,
            vec![RecipientSpec::Broadcast {
                role: UserRole::Admin
            }]
        );
    }

    #[test]
    fn test_candidate_assignment_targets_agents_before_hr() {
        let agent = Uuid::new_v4();
        let hr = Uuid::new_v4();
        let event = event(
            AuditAction::Assign,
            EntityKind::Candidate,
            None,
            json!({
                "candidateName": "Jane Doe",
                "agentIds": [agent.to_string()],
                "hrIds": [hr.to_string()],
            }),
        );

        let draft = map(&event).expect("assignment should map");
        assert_eq!(draft.notification_type, NotificationType::CandidateAssigned);
        assert_eq!(draft.priority, NotificationPriority::High);
        assert_eq!(
            draft.recipients,
            vec![
                RecipientSpec::Direct {
                    id: agent,
                    role: UserRole::Agent
                },
                RecipientSpec::Direct {
                    id: hr,
                    role: UserRole::Hr
                },
            ]
        );
    }

    #[test]
    fn test_assignment_without_ids_yields_empty_recipient_list() {
        // Legitimate: an HR with no assigned agent produces zero recipients
        // downstream, not an error.
        let event = event(AuditAction::Assign, EntityKind::Candidate, None, json!({}));

        let draft = map(&event).expect("assignment should still map");
        assert!(draft.recipients.is_empty());
    }

    #[test]
    fn test_company_added_is_low_priority_and_expires() {
        let event = event(
            AuditAction::Create,
            EntityKind::Company,
            Some(json!({ "name": "Acme" })),
            json!({}),
        );

        let draft = map(&event).expect("company creation should map");
        assert_eq!(draft.priority, NotificationPriority::Low);
        let expires_at = draft.expires_at.expect("low-priority drafts expire");
        assert!(expires_at > Utc::now() + Duration::days(89));
    }

    #[test]
    fn test_interview_update_requires_a_guard_flag() {
        let base = event(AuditAction::Update, EntityKind::Interview, None, json!({}));
        assert!(map(&base).is_none());

        let rescheduled = event(
            AuditAction::Update,
            EntityKind::Interview,
            None,
            json!({ "rescheduled": true, "scheduledAt": "2026-08-10T09:00:00Z" }),
        );
        let draft = map(&rescheduled).expect("rescheduled interview should map");
        assert_eq!(
            draft.notification_type,
            NotificationType::InterviewRescheduled
        );
        assert!(draft.message.contains("2026-08-10T09:00:00Z"));
    }
}
