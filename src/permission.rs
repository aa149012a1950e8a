use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

const MAX_PERMISSION_LEN: usize = 128;

/// Well-known permission tags used by the admin console.
///
/// The vocabulary is open: any tag accepted by the active
/// [`PermissionValidator`] can be granted and checked.
pub mod tags {
    /// Wildcard tag granting every action.
    pub const ALL: &str = "all";
    pub const ADS: &str = "ads";
    pub const USERS: &str = "users";
    pub const REPORTS: &str = "reports";
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const MESSAGES: &str = "messages";
    pub const VIP: &str = "vip";
    pub const BACKUP: &str = "backup";
    pub const ADMINS: &str = "admins";
    pub const ROLES: &str = "roles";
    pub const AUDIT: &str = "audit";
    pub const COMMENTS: &str = "comments";
    pub const TRASH: &str = "trash";
    pub const BLOCKED: &str = "blocked";
    pub const SETTINGS: &str = "settings";
}

/// Permission tag such as `ads` or `trash`.
///
/// Tags are compared verbatim. Construction trims surrounding whitespace but
/// preserves case.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Permission(String);

impl Permission {
    /// Parses and validates a permission using the default validator.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        Self::new_with(value, &DefaultPermissionValidator)
    }

    /// Parses and validates a permission with a custom validator.
    pub fn new_with(value: impl AsRef<str>, validator: &dyn PermissionValidator) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidPermission(
                "permission must not be empty".to_string(),
            ));
        }
        validator.validate(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }

    /// Creates a permission from a trusted string without validation.
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// The wildcard permission.
    pub fn all() -> Self {
        Self(tags::ALL.to_string())
    }

    /// Returns true when this is the wildcard tag.
    pub fn is_wildcard(&self) -> bool {
        self.0 == tags::ALL
    }

    /// Returns the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Permission {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

/// Permission validator interface for custom vocabularies.
pub trait PermissionValidator: Send + Sync {
    /// Validates a trimmed permission string.
    fn validate(&self, value: &str) -> Result<()>;
}

/// Default validator: any short tag without whitespace or control characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPermissionValidator;

impl PermissionValidator for DefaultPermissionValidator {
    fn validate(&self, value: &str) -> Result<()> {
        if value.len() > MAX_PERMISSION_LEN {
            return Err(Error::InvalidPermission(format!(
                "permission length must be <= {MAX_PERMISSION_LEN}"
            )));
        }
        if value
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control())
        {
            return Err(Error::InvalidPermission(
                "permission contains whitespace or control characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ordered set of permission tags granted to a role.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every tag with the default validator.
    pub fn parse<I, T>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        values.into_iter().map(Permission::new).collect()
    }

    /// Builds a set from trusted static tags.
    pub(crate) fn from_tags(values: &[&str]) -> Self {
        values
            .iter()
            .map(|tag| Permission::from_string((*tag).to_string()))
            .collect()
    }

    /// Adds a permission; returns false if it was already present.
    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    /// Returns true if the tag is present verbatim.
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Returns true if the set contains the wildcard tag.
    pub fn has_wildcard(&self) -> bool {
        self.contains(tags::ALL)
    }

    /// Exact-membership check, with the wildcard honored when `wildcard` is on.
    pub fn grants_with(&self, required: &Permission, wildcard: bool) -> bool {
        (wildcard && self.has_wildcard()) || self.contains(required.as_str())
    }

    /// Returns true if the set grants `required`, counting `all` as a wildcard.
    pub fn grants(&self, required: &Permission) -> bool {
        self.grants_with(required, true)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PermissionSet {
    type Item = Permission;
    type IntoIter = std::collections::btree_set::IntoIter<Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("-");
        }
        for (index, permission) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(permission.as_str())?;
        }
        Ok(())
    }
}
