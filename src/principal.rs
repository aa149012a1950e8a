use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::audit::{Actor, AuditLog};
use crate::error::{Error, Result, StoreError};
use crate::lock;
use crate::permission::PermissionSet;
use crate::role::RoleRegistry;
use crate::store::{PrincipalStore, RoleStore};
use crate::types::{PrincipalId, RoleName};

/// User or staff account bound to exactly one role.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Principal {
    pub id: PrincipalId,
    pub display_name: String,
    pub role: RoleName,
    pub blocked: bool,
}

/// In-memory principal store.
///
/// Holds a handle to the [`RoleRegistry`] so role references are checked on
/// assignment. Deleting principals is permanent.
#[derive(Debug, Clone)]
pub struct PrincipalRegistry {
    principals: Arc<RwLock<Vec<Principal>>>,
    roles: RoleRegistry,
    audit: AuditLog,
}

fn validate_display_name(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "display name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

impl PrincipalRegistry {
    /// Creates an empty store validating roles against `roles`.
    pub fn new(roles: RoleRegistry, audit: AuditLog) -> Self {
        Self {
            principals: Arc::new(RwLock::new(Vec::new())),
            roles,
            audit,
        }
    }

    /// Creates a principal with a generated id. `blocked` starts out false.
    pub fn create_principal(
        &self,
        actor: &Actor,
        display_name: &str,
        role: RoleName,
    ) -> Result<Principal> {
        self.create_principal_with_id(actor, PrincipalId::generate(), display_name, role)
    }

    /// Creates a principal under an id issued by the identity provider.
    pub fn create_principal_with_id(
        &self,
        actor: &Actor,
        id: PrincipalId,
        display_name: &str,
        role: RoleName,
    ) -> Result<Principal> {
        let display_name = validate_display_name(display_name)?;
        let name = role.clone();
        self.roles.while_registered(&name, || {
            let mut guard = lock::write(&self.principals);
            if guard.iter().any(|principal| principal.id == id) {
                return Err(Error::DuplicatePrincipal(id));
            }
            let principal = Principal {
                id,
                display_name,
                role,
                blocked: false,
            };
            guard.push(principal.clone());
            self.audit.record(
                actor,
                format!(
                    "created principal {} ({}) with role \"{}\"",
                    principal.id, principal.display_name, principal.role
                ),
            );
            Ok(principal)
        })
    }

    /// Reassigns a principal's role.
    pub fn set_role(&self, actor: &Actor, id: &PrincipalId, role: RoleName) -> Result<Principal> {
        let name = role.clone();
        self.roles.while_registered(&name, || {
            self.modify(actor, id, |principal| {
                principal.role = role;
                format!(
                    "changed role of principal {} to \"{}\"",
                    principal.id, principal.role
                )
            })
        })
    }

    /// Blocks or unblocks a principal.
    pub fn set_blocked(&self, actor: &Actor, id: &PrincipalId, blocked: bool) -> Result<Principal> {
        self.modify(actor, id, |principal| {
            principal.blocked = blocked;
            let verb = if blocked { "blocked" } else { "unblocked" };
            format!("{verb} principal {}", principal.id)
        })
    }

    /// Removes a principal permanently.
    pub fn delete_principal(&self, actor: &Actor, id: &PrincipalId) -> Result<Principal> {
        let mut guard = lock::write(&self.principals);
        let index = guard
            .iter()
            .position(|principal| &principal.id == id)
            .ok_or_else(|| Error::PrincipalNotFound(id.clone()))?;
        let removed = guard.remove(index);
        self.audit
            .record(actor, format!("deleted principal {}", removed.id));
        Ok(removed)
    }

    pub fn get(&self, id: &PrincipalId) -> Option<Principal> {
        lock::read(&self.principals)
            .iter()
            .find(|principal| &principal.id == id)
            .cloned()
    }

    /// Returns all principals in creation order.
    pub fn list(&self) -> Vec<Principal> {
        lock::read(&self.principals).clone()
    }

    /// Returns blocked principals in creation order.
    pub fn list_blocked(&self) -> Vec<Principal> {
        lock::read(&self.principals)
            .iter()
            .filter(|principal| principal.blocked)
            .cloned()
            .collect()
    }

    /// Resolves a principal's current permissions.
    ///
    /// Unknown and blocked principals, and principals whose role was deleted,
    /// resolve to the empty set.
    pub fn effective_permissions(&self, id: &PrincipalId) -> PermissionSet {
        match self.get(id) {
            Some(principal) if !principal.blocked => self.roles.resolve_permissions(&principal.role),
            _ => PermissionSet::new(),
        }
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    // Applies `change` under the write lock and records the description it
    // returns before the lock is released.
    fn modify<F>(&self, actor: &Actor, id: &PrincipalId, change: F) -> Result<Principal>
    where
        F: FnOnce(&mut Principal) -> String,
    {
        let mut guard = lock::write(&self.principals);
        let principal = guard
            .iter_mut()
            .find(|principal| &principal.id == id)
            .ok_or_else(|| Error::PrincipalNotFound(id.clone()))?;
        let description = change(principal);
        let updated = principal.clone();
        self.audit.record(actor, description);
        Ok(updated)
    }
}

#[async_trait]
impl PrincipalStore for PrincipalRegistry {
    async fn principal(
        &self,
        principal: &PrincipalId,
    ) -> std::result::Result<Option<Principal>, StoreError> {
        Ok(self.get(principal))
    }
}

/// Role registry and principal store viewed as one [`Store`](crate::Store).
#[derive(Debug, Clone)]
pub struct Directory {
    principals: PrincipalRegistry,
}

impl Directory {
    pub fn new(principals: PrincipalRegistry) -> Self {
        Self { principals }
    }

    pub fn principals(&self) -> &PrincipalRegistry {
        &self.principals
    }

    pub fn roles(&self) -> &RoleRegistry {
        self.principals.roles()
    }
}

#[async_trait]
impl RoleStore for Directory {
    async fn role_permissions(
        &self,
        role: &RoleName,
    ) -> std::result::Result<Option<PermissionSet>, StoreError> {
        self.roles().role_permissions(role).await
    }
}

#[async_trait]
impl PrincipalStore for Directory {
    async fn principal(
        &self,
        principal: &PrincipalId,
    ) -> std::result::Result<Option<Principal>, StoreError> {
        self.principals.principal(principal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn registry() -> (PrincipalRegistry, AuditLog) {
        let audit = AuditLog::new();
        let roles = RoleRegistry::with_builtin_roles(audit.clone());
        (PrincipalRegistry::new(roles, audit.clone()), audit)
    }

    fn role(name: &str) -> RoleName {
        RoleName::try_from(name).unwrap()
    }

    #[test]
    fn create_principal_should_default_to_unblocked() {
        let (store, audit) = registry();
        let principal = store
            .create_principal(&Actor::System, "Moderator One", role("moderator"))
            .unwrap();

        assert!(!principal.blocked);
        assert_eq!(principal.display_name, "Moderator One");
        assert_eq!(store.get(&principal.id), Some(principal));
        assert_eq!(audit.len(), 1);
    }

    #[test]
    fn create_principal_should_reject_unknown_role() {
        let (store, audit) = registry();
        let err = store
            .create_principal(&Actor::System, "Ghost", role("ghost"))
            .expect_err("unknown role");

        assert!(matches!(err, Error::RoleNotFound(_)));
        assert!(store.list().is_empty());
        assert!(audit.is_empty());
    }

    #[test]
    fn create_principal_with_id_should_reject_duplicates() {
        let (store, audit) = registry();
        let id = PrincipalId::try_from("yadegari").unwrap();
        store
            .create_principal_with_id(&Actor::System, id.clone(), "Manager", role("manager"))
            .unwrap();
        let err = store
            .create_principal_with_id(&Actor::System, id, "Other", role("user"))
            .expect_err("duplicate");

        assert!(matches!(err, Error::DuplicatePrincipal(_)));
        assert_eq!(audit.len(), 1);
    }

    #[test]
    fn create_principal_should_reject_blank_display_name() {
        let (store, _) = registry();
        let err = store
            .create_principal(&Actor::System, "   ", role("user"))
            .expect_err("blank");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn set_role_should_check_principal_and_role() {
        let (store, audit) = registry();
        let principal = store
            .create_principal(&Actor::System, "Someone", role("user"))
            .unwrap();

        let err = store
            .set_role(&Actor::System, &principal.id, role("ghost"))
            .expect_err("unknown role");
        assert!(matches!(err, Error::RoleNotFound(_)));

        let missing = PrincipalId::try_from("missing").unwrap();
        let err = store
            .set_role(&Actor::System, &missing, role("admin"))
            .expect_err("unknown principal");
        assert!(matches!(err, Error::PrincipalNotFound(_)));

        let updated = store
            .set_role(&Actor::System, &principal.id, role("manager"))
            .unwrap();
        assert_eq!(updated.role, role("manager"));
        assert_eq!(audit.len(), 2);
    }

    #[test]
    fn set_blocked_should_keep_principal() {
        let (store, _) = registry();
        let principal = store
            .create_principal(&Actor::System, "Someone", role("admin"))
            .unwrap();

        store
            .set_blocked(&Actor::System, &principal.id, true)
            .unwrap();

        assert_eq!(store.list_blocked().len(), 1);
        assert!(store.effective_permissions(&principal.id).is_empty());

        store
            .set_blocked(&Actor::System, &principal.id, false)
            .unwrap();
        assert!(store.list_blocked().is_empty());
        assert!(store.effective_permissions(&principal.id).has_wildcard());
    }

    #[test]
    fn delete_principal_should_remove_permanently() {
        let (store, audit) = registry();
        let principal = store
            .create_principal(&Actor::System, "Someone", role("user"))
            .unwrap();

        store
            .delete_principal(&Actor::System, &principal.id)
            .unwrap();
        assert!(store.get(&principal.id).is_none());

        let err = store
            .delete_principal(&Actor::System, &principal.id)
            .expect_err("already gone");
        assert!(matches!(err, Error::PrincipalNotFound(_)));
        assert_eq!(audit.len(), 2);
    }

    #[test]
    fn deleted_role_should_resolve_to_empty_permissions() {
        let (store, _) = registry();
        let roles = store.roles().clone();
        roles
            .create_role(
                &Actor::System,
                role("supervisor"),
                PermissionSet::parse(["ads"]).unwrap(),
            )
            .unwrap();
        let principal = store
            .create_principal(&Actor::System, "Supervisor", role("supervisor"))
            .unwrap();

        roles.delete_role(&Actor::System, &role("supervisor")).unwrap();

        assert_eq!(store.get(&principal.id).unwrap().role, role("supervisor"));
        assert!(store.effective_permissions(&principal.id).is_empty());
    }

    #[test]
    fn role_assignment_should_not_race_role_deletion() {
        let (store, audit) = registry();
        let roles = store.roles().clone();
        let principal = store
            .create_principal(&Actor::System, "Rotating", role("user"))
            .unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..200 {
                    let _ = roles.create_role(&Actor::System, role("temp"), PermissionSet::new());
                    let _ = roles.delete_role(&Actor::System, &role("temp"));
                }
            });
            for _ in 0..3 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        match store.set_role(&Actor::System, &principal.id, role("temp")) {
                            Ok(_) | Err(Error::RoleNotFound(_)) => {}
                            Err(err) => panic!("unexpected error {err}"),
                        }
                        match store.create_principal(&Actor::System, "Temp", role("temp")) {
                            Ok(_) | Err(Error::RoleNotFound(_)) => {}
                            Err(err) => panic!("unexpected error {err}"),
                        }
                    }
                });
            }
        });

        // Oldest first: every assignment to "temp" must land while it exists.
        let mut exists = false;
        for entry in audit.query().rev() {
            let action = entry.action.as_str();
            if action.starts_with("created role \"temp\"") {
                exists = true;
            } else if action == "deleted role \"temp\"" {
                exists = false;
            } else if action.ends_with("to \"temp\"") || action.ends_with("with role \"temp\"") {
                assert!(exists, "assigned deleted role: {action}");
            }
        }
    }

    #[test]
    fn directory_should_serve_both_store_traits() {
        let (store, _) = registry();
        let principal = store
            .create_principal(&Actor::System, "Someone", role("moderator"))
            .unwrap();
        let directory = Directory::new(store);

        let found = block_on(directory.principal(&principal.id)).unwrap();
        assert_eq!(found, Some(principal));
        let perms = block_on(directory.role_permissions(&role("moderator"))).unwrap();
        assert_eq!(perms, Some(PermissionSet::parse(["ads"]).unwrap()));
    }
}
