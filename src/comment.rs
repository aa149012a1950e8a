use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::audit::{Actor, AuditLog};
use crate::error::{Error, Result};
use crate::lock;
use crate::types::{CommentId, EntityId};

/// Moderation state of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        })
    }
}

/// Customer review of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    pub id: CommentId,
    pub product: EntityId,
    pub author: String,
    pub rating: u8,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

/// Comments awaiting or past moderation.
#[derive(Debug, Clone)]
pub struct CommentBoard {
    comments: Arc<RwLock<Vec<Comment>>>,
    audit: AuditLog,
}

impl CommentBoard {
    pub fn new(audit: AuditLog) -> Self {
        Self {
            comments: Arc::new(RwLock::new(Vec::new())),
            audit,
        }
    }

    /// Adds a pending comment. Ratings run from 1 to 5.
    pub fn submit(
        &self,
        actor: &Actor,
        product: EntityId,
        author: &str,
        rating: u8,
        content: &str,
    ) -> Result<Comment> {
        let author = author.trim();
        let content = content.trim();
        if author.is_empty() || content.is_empty() {
            return Err(Error::InvalidInput(
                "comment author and content must not be empty".to_string(),
            ));
        }
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidInput(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        let comment = Comment {
            id: CommentId::generate(),
            product,
            author: author.to_string(),
            rating,
            content: content.to_string(),
            status: CommentStatus::Pending,
            created_at: self.audit.clock().now(),
        };
        let mut guard = lock::write(&self.comments);
        guard.push(comment.clone());
        self.audit.record(
            actor,
            format!(
                "comment {} submitted by {} on product {}",
                comment.id, comment.author, comment.product
            ),
        );
        Ok(comment)
    }

    pub fn approve(&self, actor: &Actor, id: &CommentId) -> Result<Comment> {
        self.set_status(actor, id, CommentStatus::Approved)
    }

    pub fn reject(&self, actor: &Actor, id: &CommentId) -> Result<Comment> {
        self.set_status(actor, id, CommentStatus::Rejected)
    }

    /// Removes a comment permanently.
    pub fn delete(&self, actor: &Actor, id: &CommentId) -> Result<Comment> {
        let mut guard = lock::write(&self.comments);
        let index = guard
            .iter()
            .position(|comment| &comment.id == id)
            .ok_or_else(|| Error::CommentNotFound(id.clone()))?;
        let removed = guard.remove(index);
        self.audit.record(
            actor,
            format!("deleted comment {} by {}", removed.id, removed.author),
        );
        Ok(removed)
    }

    pub fn get(&self, id: &CommentId) -> Option<Comment> {
        lock::read(&self.comments)
            .iter()
            .find(|comment| &comment.id == id)
            .cloned()
    }

    pub fn list(&self) -> Vec<Comment> {
        lock::read(&self.comments).clone()
    }

    pub fn list_by_status(&self, status: CommentStatus) -> Vec<Comment> {
        lock::read(&self.comments)
            .iter()
            .filter(|comment| comment.status == status)
            .cloned()
            .collect()
    }

    fn set_status(&self, actor: &Actor, id: &CommentId, status: CommentStatus) -> Result<Comment> {
        let mut guard = lock::write(&self.comments);
        let comment = guard
            .iter_mut()
            .find(|comment| &comment.id == id)
            .ok_or_else(|| Error::CommentNotFound(id.clone()))?;
        if comment.status == status {
            return Err(Error::CommentStatusUnchanged {
                id: id.clone(),
                status,
            });
        }
        comment.status = status;
        let updated = comment.clone();
        self.audit.record(
            actor,
            format!("{status} comment {} by {}", updated.id, updated.author),
        );
        Ok(updated)
    }
}
