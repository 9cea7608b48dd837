use std::sync::Arc;

use crate::error::Result;
use crate::user::{UserDirectory, UserRole};
use uuid::Uuid;

/// Where a notification should go, before role broadcasts are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientSpec {
    /// Every currently-active user holding the role.
    Broadcast { role: UserRole },
    /// A concrete user, taken at face value without a directory lookup.
    Direct { id: Uuid, role: UserRole },
}

/// One resolved delivery target. The role is frozen here and stored on the
/// notification row; later role changes do not rewrite history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcreteRecipient {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct RecipientResolver {
    directory: Arc<dyn UserDirectory>,
}

impl RecipientResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Expands specs in input order. Broadcasts read the directory live;
    /// direct ids pass through unvalidated. Recipients are intentionally not
    /// deduplicated across specs, so an explicit id overlapping a broadcast
    /// yields two notifications. Any directory failure aborts the whole
    /// resolution.
    pub async fn resolve(&self, specs: &[RecipientSpec]) -> Result<Vec<ConcreteRecipient>> {
        let mut recipients = Vec::new();

        for spec in specs {
            match *spec {
                RecipientSpec::Broadcast { role } => {
                    let ids = self.directory.active_user_ids_with_role(role).await?;
                    recipients.extend(
                        ids.into_iter()
                            .map(|user_id| ConcreteRecipient { user_id, role }),
                    );
                }
                RecipientSpec::Direct { id, role } => {
                    recipients.push(ConcreteRecipient { user_id: id, role });
                }
            }
        }

        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeDirectory {
        members: HashMap<UserRole, Vec<Uuid>>,
        fail: bool,
    }

    impl FakeDirectory {
        fn new(members: HashMap<UserRole, Vec<Uuid>>) -> Arc<Self> {
            Arc::new(Self {
                members,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                members: HashMap::new(),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn active_user_ids_with_role(&self, role: UserRole) -> Result<Vec<Uuid>> {
            if self.fail {
                return Err(AppError::InternalError);
            }
            Ok(self.members.get(&role).cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_broadcast_expands_to_all_role_members() {
        let admins = vec![Uuid::new_v4(), Uuid::new_v4()];
        let directory =
            FakeDirectory::new(HashMap::from([(UserRole::Admin, admins.clone())]));
        let resolver = RecipientResolver::new(directory);

        let resolved = resolver
            .resolve(&[RecipientSpec::Broadcast {
                role: UserRole::Admin,
            }])
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].user_id, admins[0]);
        assert_eq!(resolved[1].user_id, admins[1]);
        assert!(resolved.iter().all(|r| r.role == UserRole::Admin));
    }

    #[tokio::test]
    async fn test_direct_specs_pass_through_without_validation() {
        // Directory is empty, but the direct id is delivered anyway.
        let directory = FakeDirectory::new(HashMap::new());
        let resolver = RecipientResolver::new(directory);
        let unknown = Uuid::new_v4();

        let resolved = resolver
            .resolve(&[RecipientSpec::Direct {
                id: unknown,
                role: UserRole::Hr,
            }])
            .await
            .unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].user_id, unknown);
        assert_eq!(resolved[0].role, UserRole::Hr);
    }

    #[tokio::test]
    async fn test_overlapping_specs_are_not_deduplicated() {
        let admin = Uuid::new_v4();
        let directory = FakeDirectory::new(HashMap::from([(UserRole::Admin, vec![admin])]));
        let resolver = RecipientResolver::new(directory);

        let resolved = resolver
            .resolve(&[
                RecipientSpec::Broadcast {
                    role: UserRole::Admin,
                },
                RecipientSpec::Direct {
                    id: admin,
                    role: UserRole::Admin,
                },
            ])
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].user_id, admin);
        assert_eq!(resolved[1].user_id, admin);
    }

    #[tokio::test]
    async fn test_specs_resolve_in_input_order() {
        let admin = Uuid::new_v4();
        let hr = Uuid::new_v4();
        let agent = Uuid::new_v4();
        let directory = FakeDirectory::new(HashMap::from([(UserRole::Admin, vec![admin])]));
        let resolver = RecipientResolver::new(directory);

        let resolved = resolver
            .resolve(&[
                RecipientSpec::Direct {
                    id: hr,
                    role: UserRole::Hr,
                },
                RecipientSpec::Broadcast {
                    role: UserRole::Admin,
                },
                RecipientSpec::Direct {
                    id: agent,
                    role: UserRole::Agent,
                },
            ])
            .await
            .unwrap();

        let ids: Vec<Uuid> = resolved.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![hr, admin, agent]);
    }

    #[tokio::test]
    async fn test_directory_failure_aborts_whole_resolution() {
        let resolver = RecipientResolver::new(FakeDirectory::failing());

        let result = resolver
            .resolve(&[
                RecipientSpec::Direct {
                    id: Uuid::new_v4(),
                    role: UserRole::Hr,
                },
                RecipientSpec::Broadcast {
                    role: UserRole::Admin,
                },
            ])
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_role_resolves_to_no_recipients() {
        let directory = FakeDirectory::new(HashMap::new());
        let resolver = RecipientResolver::new(directory);

        let resolved = resolver
            .resolve(&[RecipientSpec::Broadcast {
                role: UserRole::Agent,
            }])
            .await
            .unwrap();

        assert!(resolved.is_empty());
    }
}
