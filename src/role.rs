use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::audit::{Actor, AuditLog};
use crate::error::{Error, Result, StoreError};
use crate::lock;
use crate::permission::{PermissionSet, tags};
use crate::store::RoleStore;
use crate::types::RoleName;

/// Roles that always exist by name and cannot be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinRole {
    Admin,
    Manager,
    Moderator,
    User,
}

impl BuiltinRole {
    pub const ALL: [Self; 4] = [Self::Admin, Self::Manager, Self::Moderator, Self::User];

    /// Registry name of the role.
    pub fn name(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Moderator => "moderator",
            Self::User => "user",
        }
    }

    /// Looks up a built-in role by exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.name() == name)
    }

    /// Stock permission set the role is seeded with.
    pub fn default_permissions(self) -> PermissionSet {
        match self {
            Self::Admin => PermissionSet::from_tags(&[tags::ALL]),
            Self::Manager => PermissionSet::from_tags(&[
                tags::ADS,
                tags::USERS,
                tags::REPORTS,
                tags::PRODUCTS,
                tags::CATEGORIES,
                tags::MESSAGES,
                tags::VIP,
                tags::BACKUP,
                tags::ADMINS,
                tags::ROLES,
                tags::AUDIT,
                tags::COMMENTS,
                tags::TRASH,
                tags::BLOCKED,
            ]),
            Self::Moderator => PermissionSet::from_tags(&[tags::ADS]),
            Self::User => PermissionSet::new(),
        }
    }

    pub fn role_name(self) -> RoleName {
        RoleName::from_string(self.name().to_string())
    }
}

/// Named permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Role {
    pub name: RoleName,
    pub permissions: PermissionSet,
}

impl Role {
    /// Returns true for the four built-in role names.
    pub fn is_builtin(&self) -> bool {
        BuiltinRole::from_name(self.name.as_str()).is_some()
    }
}

/// In-memory role registry.
///
/// Roles are kept in creation order. Mutations take the registry write lock
/// and record their audit entry before releasing it.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: Arc<RwLock<Vec<Role>>>,
    audit: AuditLog,
}

impl RoleRegistry {
    /// Creates an empty registry.
    pub fn new(audit: AuditLog) -> Self {
        Self {
            roles: Arc::new(RwLock::new(Vec::new())),
            audit,
        }
    }

    /// Creates a registry holding the built-in roles with their stock permissions.
    pub fn with_builtin_roles(audit: AuditLog) -> Self {
        let roles = BuiltinRole::ALL
            .into_iter()
            .map(|role| Role {
                name: role.role_name(),
                permissions: role.default_permissions(),
            })
            .collect();
        Self {
            roles: Arc::new(RwLock::new(roles)),
            audit,
        }
    }

    /// Registers a new role.
    pub fn create_role(
        &self,
        actor: &Actor,
        name: RoleName,
        permissions: PermissionSet,
    ) -> Result<Role> {
        let mut guard = lock::write(&self.roles);
        if guard.iter().any(|role| role.name == name) {
            tracing::debug!(role = %name, "rejected duplicate role");
            return Err(Error::DuplicateRole(name));
        }
        let role = Role { name, permissions };
        guard.push(role.clone());
        self.audit.record(
            actor,
            format!("created role \"{}\" with permissions [{}]", role.name, role.permissions),
        );
        Ok(role)
    }

    /// Removes a custom role.
    ///
    /// Principals still bound to the role are left as they are and resolve to
    /// an empty permission set from then on.
    pub fn delete_role(&self, actor: &Actor, name: &RoleName) -> Result<Role> {
        if BuiltinRole::from_name(name.as_str()).is_some() {
            return Err(Error::ProtectedRole(name.clone()));
        }
        let mut guard = lock::write(&self.roles);
        let index = guard
            .iter()
            .position(|role| &role.name == name)
            .ok_or_else(|| Error::RoleNotFound(name.clone()))?;
        let removed = guard.remove(index);
        self.audit
            .record(actor, format!("deleted role \"{}\"", removed.name));
        Ok(removed)
    }

    /// Replaces the permission set of a role.
    pub fn set_permissions(
        &self,
        actor: &Actor,
        name: &RoleName,
        permissions: PermissionSet,
    ) -> Result<Role> {
        let mut guard = lock::write(&self.roles);
        let role = guard
            .iter_mut()
            .find(|role| &role.name == name)
            .ok_or_else(|| Error::RoleNotFound(name.clone()))?;
        role.permissions = permissions;
        let updated = role.clone();
        self.audit.record(
            actor,
            format!(
                "set permissions of role \"{}\" to [{}]",
                updated.name, updated.permissions
            ),
        );
        Ok(updated)
    }

    /// Returns the permission set of a role, or the empty set if unknown.
    pub fn resolve_permissions(&self, name: &RoleName) -> PermissionSet {
        self.get(name)
            .map(|role| role.permissions)
            .unwrap_or_default()
    }

    pub fn get(&self, name: &RoleName) -> Option<Role> {
        lock::read(&self.roles)
            .iter()
            .find(|role| &role.name == name)
            .cloned()
    }

    pub fn contains(&self, name: &RoleName) -> bool {
        lock::read(&self.roles).iter().any(|role| &role.name == name)
    }

    /// Runs `assign` with the registry read lock held, after checking that
    /// `name` is registered. The role cannot be deleted until `assign`
    /// returns. Lock order: roles, then the caller's own lock.
    pub(crate) fn while_registered<T, F>(&self, name: &RoleName, assign: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let guard = lock::read(&self.roles);
        if !guard.iter().any(|role| &role.name == name) {
            return Err(Error::RoleNotFound(name.clone()));
        }
        let result = assign();
        drop(guard);
        result
    }

    /// Returns all roles in creation order.
    pub fn list(&self) -> Vec<Role> {
        lock::read(&self.roles).clone()
    }
}

#[async_trait]
impl RoleStore for RoleRegistry {
    async fn role_permissions(
        &self,
        role: &RoleName,
    ) -> std::result::Result<Option<PermissionSet>, StoreError> {
        Ok(self.get(role).map(|role| role.permissions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permission;

    fn role(name: &str) -> RoleName {
        RoleName::try_from(name).unwrap()
    }

    fn perms(values: &[&str]) -> PermissionSet {
        PermissionSet::parse(values).unwrap()
    }

    #[test]
    fn builtin_roles_should_be_seeded_with_stock_permissions() {
        let registry = RoleRegistry::with_builtin_roles(AuditLog::new());
        let names: Vec<String> = registry
            .list()
            .into_iter()
            .map(|role| role.name.to_string())
            .collect();

        assert_eq!(names, ["admin", "manager", "moderator", "user"]);
        assert!(registry.resolve_permissions(&role("admin")).has_wildcard());
        assert!(
            registry
                .resolve_permissions(&role("manager"))
                .grants(&Permission::try_from("trash").unwrap())
        );
        assert!(!registry.resolve_permissions(&role("manager")).has_wildcard());
        assert!(registry.resolve_permissions(&role("user")).is_empty());
    }

    #[test]
    fn create_role_should_reject_duplicate_name() {
        let audit = AuditLog::new();
        let registry = RoleRegistry::with_builtin_roles(audit.clone());

        registry
            .create_role(&Actor::System, role("supervisor"), perms(&["ads"]))
            .unwrap();
        let err = registry
            .create_role(&Actor::System, role("supervisor"), perms(&["users"]))
            .expect_err("duplicate");

        assert!(matches!(err, Error::DuplicateRole(_)));
        assert_eq!(audit.len(), 1);
        assert_eq!(
            registry.resolve_permissions(&role("supervisor")),
            perms(&["ads"])
        );
    }

    #[test]
    fn role_names_should_be_case_sensitive() {
        let registry = RoleRegistry::with_builtin_roles(AuditLog::new());
        registry
            .create_role(&Actor::System, role("Admin"), PermissionSet::new())
            .unwrap();
        registry.delete_role(&Actor::System, &role("Admin")).unwrap();
    }

    #[test]
    fn delete_role_should_protect_builtins_even_when_absent() {
        let registry = RoleRegistry::new(AuditLog::new());
        for builtin in BuiltinRole::ALL {
            let err = registry
                .delete_role(&Actor::System, &builtin.role_name())
                .expect_err("protected");
            assert!(matches!(err, Error::ProtectedRole(_)));
        }
    }

    #[test]
    fn delete_role_should_fail_for_unknown_role() {
        let registry = RoleRegistry::with_builtin_roles(AuditLog::new());
        let err = registry
            .delete_role(&Actor::System, &role("ghost"))
            .expect_err("missing");
        assert!(matches!(err, Error::RoleNotFound(_)));
    }

    #[test]
    fn set_permissions_should_edit_builtin_role() {
        let audit = AuditLog::new();
        let registry = RoleRegistry::with_builtin_roles(audit.clone());

        registry
            .set_permissions(&Actor::System, &role("moderator"), perms(&["ads", "comments"]))
            .unwrap();

        assert_eq!(
            registry.resolve_permissions(&role("moderator")),
            perms(&["ads", "comments"])
        );
        assert_eq!(audit.len(), 1);
    }

    #[test]
    fn set_permissions_should_fail_for_unknown_role() {
        let audit = AuditLog::new();
        let registry = RoleRegistry::with_builtin_roles(audit.clone());
        let err = registry
            .set_permissions(&Actor::System, &role("ghost"), PermissionSet::new())
            .expect_err("missing");

        assert!(matches!(err, Error::RoleNotFound(_)));
        assert!(audit.is_empty());
    }

    #[test]
    fn resolve_unknown_role_should_be_empty() {
        let registry = RoleRegistry::new(AuditLog::new());
        assert!(registry.resolve_permissions(&role("ghost")).is_empty());
    }
}
