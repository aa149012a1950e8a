//! Append-only audit log.
//!
//! Every successful mutation in the registries and stores records exactly one
//! [`AuditEntry`]. Entries are never edited or removed. [`AuditLog::query`]
//! iterates over a snapshot, newest first, so concurrent appends never show
//! up half-way through a read.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::vec;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::lock;
use crate::types::PrincipalId;

/// Monotonically increasing audit entry id.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AuditId(u64);

impl AuditId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who performed an audited action.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Actor {
    /// A signed-in principal.
    Principal(PrincipalId),
    /// Internal mutations such as seeding.
    System,
}

impl Actor {
    /// Returns the principal id, if any.
    pub fn principal(&self) -> Option<&PrincipalId> {
        match self {
            Self::Principal(id) => Some(id),
            Self::System => None,
        }
    }
}

impl From<PrincipalId> for Actor {
    fn from(id: PrincipalId) -> Self {
        Self::Principal(id)
    }
}

impl From<&PrincipalId> for Actor {
    fn from(id: &PrincipalId) -> Self {
        Self::Principal(id.clone())
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Principal(id) => f.write_str(id.as_str()),
            Self::System => f.write_str("system"),
        }
    }
}

/// One recorded action.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuditEntry {
    pub id: AuditId,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
    pub action: String,
}

/// Process-wide append-only sink, cheap to clone.
#[derive(Clone)]
pub struct AuditLog {
    inner: Arc<Inner>,
}

struct Inner {
    entries: RwLock<Vec<Arc<AuditEntry>>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    /// Creates an empty log stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty log stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(Vec::new()),
                clock,
            }),
        }
    }

    /// Appends an entry and returns its id.
    ///
    /// The id and the timestamp are assigned under the append lock, so id
    /// order always matches append order.
    pub fn record(&self, actor: &Actor, action: impl Into<String>) -> AuditId {
        let action = action.into();
        let mut guard = lock::write(&self.inner.entries);
        let id = AuditId(guard.len() as u64 + 1);
        let entry = AuditEntry {
            id,
            timestamp: self.inner.clock.now(),
            actor: actor.clone(),
            action,
        };
        tracing::info!(
            target: "rs_backoffice::audit",
            id = id.get(),
            actor = %entry.actor,
            action = %entry.action,
            "audit entry recorded"
        );
        guard.push(Arc::new(entry));
        id
    }

    /// Returns a snapshot of the log, most recent entry first.
    ///
    /// Each call yields an independent iterator; entries appended afterwards
    /// are not visible to it.
    pub fn query(&self) -> AuditQuery {
        let snapshot = lock::read(&self.inner.entries).clone();
        AuditQuery {
            entries: snapshot.into_iter().rev(),
        }
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        lock::read(&self.inner.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }
}

/// Newest-first iterator over an audit snapshot.
#[derive(Debug, Clone)]
pub struct AuditQuery {
    entries: std::iter::Rev<vec::IntoIter<Arc<AuditEntry>>>,
}

impl Iterator for AuditQuery {
    type Item = Arc<AuditEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl DoubleEndedIterator for AuditQuery {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl ExactSizeIterator for AuditQuery {}
