use crate::error::{Error, Result};
use crate::permission::{Permission, PermissionSet};
use crate::store::Store;
use crate::types::PrincipalId;

/// Authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Permission is granted.
    Allow,
    /// Permission is denied.
    Deny,
}

impl Decision {
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Role-based authorization engine over a pluggable store.
///
/// Decisions are fail-closed: unknown principals, blocked principals and
/// principals whose role has disappeared are denied everything.
#[derive(Debug)]
pub struct Engine<S> {
    store: S,
    enable_wildcard: bool,
}

/// Builder for [`Engine`].
#[derive(Debug)]
pub struct EngineBuilder<S> {
    store: S,
    enable_wildcard: bool,
}

impl<S> EngineBuilder<S> {
    /// Creates a new builder with default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            enable_wildcard: true,
        }
    }

    /// Enables or disables the `all` wildcard. When disabled `all` is an
    /// ordinary tag that only grants itself.
    pub fn enable_wildcard(mut self, on: bool) -> Self {
        self.enable_wildcard = on;
        self
    }

    /// Builds the engine.
    pub fn build(self) -> Engine<S> {
        Engine {
            store: self.store,
            enable_wildcard: self.enable_wildcard,
        }
    }
}

impl<S> Engine<S> {
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> Engine<S>
where
    S: Store,
{
    /// Decides whether `principal` may perform `permission`.
    pub async fn authorize(
        &self,
        principal: &PrincipalId,
        permission: &Permission,
    ) -> Result<Decision> {
        let permissions = self.effective_permissions(principal).await?;
        let decision = Decision::from(permissions.grants_with(permission, self.enable_wildcard));
        tracing::debug!(
            principal = %principal,
            permission = %permission,
            decision = ?decision,
            "authorization evaluated"
        );
        Ok(decision)
    }

    /// Allows when any of `permissions` is granted.
    pub async fn authorize_any(
        &self,
        principal: &PrincipalId,
        permissions: &[Permission],
    ) -> Result<Decision> {
        let granted = self.effective_permissions(principal).await?;
        let allowed = permissions
            .iter()
            .any(|permission| granted.grants_with(permission, self.enable_wildcard));
        Ok(Decision::from(allowed))
    }

    /// Returns the permission set currently in effect for `principal`.
    ///
    /// Empty for unknown or blocked principals and for dangling roles.
    pub async fn effective_permissions(&self, principal: &PrincipalId) -> Result<PermissionSet> {
        let Some(record) = self
            .store
            .principal(principal)
            .await
            .map_err(Error::from)?
        else {
            return Ok(PermissionSet::new());
        };
        if record.blocked {
            return Ok(PermissionSet::new());
        }
        let permissions = self
            .store
            .role_permissions(&record.role)
            .await
            .map_err(Error::from)?;
        Ok(permissions.unwrap_or_else(|| {
            tracing::warn!(
                principal = %principal,
                role = %record.role,
                "principal references a missing role"
            );
            PermissionSet::new()
        }))
    }
}
