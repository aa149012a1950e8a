use crate::error::StoreError;
use crate::permission::PermissionSet;
use crate::principal::Principal;
use crate::types::{PrincipalId, RoleName};
use async_trait::async_trait;

/// Read interface over role definitions.
#[async_trait]
pub trait RoleStore {
    /// Returns the permission set bound to a role, or `None` if the role is unknown.
    async fn role_permissions(
        &self,
        role: &RoleName,
    ) -> std::result::Result<Option<PermissionSet>, StoreError>;
}

/// Read interface over principal accounts.
#[async_trait]
pub trait PrincipalStore {
    /// Returns a principal by id.
    async fn principal(
        &self,
        principal: &PrincipalId,
    ) -> std::result::Result<Option<Principal>, StoreError>;
}

/// Composite store trait consumed by the authorization engine.
pub trait Store: RoleStore + PrincipalStore + Send + Sync {}

impl<T> Store for T where T: RoleStore + PrincipalStore + Send + Sync {}
