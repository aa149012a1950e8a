use crate::comment::CommentStatus;
use crate::permission::Permission;
use crate::types::{CollectionName, CommentId, EntityId, PrincipalId, RoleName};
use thiserror::Error;

/// Store-layer error type.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Store error wrapper.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
    /// Invalid identifier input.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Invalid permission input.
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
    /// Invalid field value supplied by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A role with the same name already exists.
    #[error("role {0} already exists")]
    DuplicateRole(RoleName),
    /// Built-in roles cannot be removed.
    #[error("role {0} is built in and cannot be deleted")]
    ProtectedRole(RoleName),
    /// Role is not registered.
    #[error("role {0} not found")]
    RoleNotFound(RoleName),
    /// A principal with the same id already exists.
    #[error("principal {0} already exists")]
    DuplicatePrincipal(PrincipalId),
    /// Principal is not registered.
    #[error("principal {0} not found")]
    PrincipalNotFound(PrincipalId),
    /// Entity does not exist in the collection, active or trashed.
    #[error("{collection}/{id} not found")]
    NotFound {
        collection: CollectionName,
        id: EntityId,
    },
    /// Entity is in the trash and cannot be edited.
    #[error("{collection}/{id} is trashed and cannot be modified")]
    EntityTrashed {
        collection: CollectionName,
        id: EntityId,
    },
    /// Entity is already in the trash.
    #[error("{collection}/{id} is already trashed")]
    AlreadyTrashed {
        collection: CollectionName,
        id: EntityId,
    },
    /// Entity is active; restore and purge need a trashed entity.
    #[error("{collection}/{id} is not trashed")]
    NotTrashed {
        collection: CollectionName,
        id: EntityId,
    },
    /// Principal lacks the permission required for the operation.
    #[error("principal {principal} is not allowed to perform {permission}")]
    Unauthorized {
        principal: PrincipalId,
        permission: Permission,
    },
    /// Category name is already listed.
    #[error("category {0:?} already exists")]
    DuplicateCategory(String),
    /// Category name is not listed.
    #[error("category {0:?} not found")]
    CategoryNotFound(String),
    /// Comment does not exist.
    #[error("comment {0} not found")]
    CommentNotFound(CommentId),
    /// Comment already has the requested moderation status.
    #[error("comment {id} is already {status}")]
    CommentStatusUnchanged { id: CommentId, status: CommentStatus },
}

/// Payload-free classification of [`Error`].
///
/// The presentation layer maps these to user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    Store,
    InvalidId,
    InvalidPermission,
    InvalidInput,
    DuplicateRole,
    ProtectedRole,
    RoleNotFound,
    DuplicatePrincipal,
    PrincipalNotFound,
    NotFound,
    EntityTrashed,
    AlreadyTrashed,
    NotTrashed,
    Unauthorized,
    DuplicateCategory,
    CategoryNotFound,
    CommentNotFound,
    CommentStatusUnchanged,
}

impl Error {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(_) => ErrorKind::Store,
            Self::InvalidId(_) => ErrorKind::InvalidId,
            Self::InvalidPermission(_) => ErrorKind::InvalidPermission,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::DuplicateRole(_) => ErrorKind::DuplicateRole,
            Self::ProtectedRole(_) => ErrorKind::ProtectedRole,
            Self::RoleNotFound(_) => ErrorKind::RoleNotFound,
            Self::DuplicatePrincipal(_) => ErrorKind::DuplicatePrincipal,
            Self::PrincipalNotFound(_) => ErrorKind::PrincipalNotFound,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::EntityTrashed { .. } => ErrorKind::EntityTrashed,
            Self::AlreadyTrashed { .. } => ErrorKind::AlreadyTrashed,
            Self::NotTrashed { .. } => ErrorKind::NotTrashed,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::DuplicateCategory(_) => ErrorKind::DuplicateCategory,
            Self::CategoryNotFound(_) => ErrorKind::CategoryNotFound,
            Self::CommentNotFound(_) => ErrorKind::CommentNotFound,
            Self::CommentStatusUnchanged { .. } => ErrorKind::CommentStatusUnchanged,
        }
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}
