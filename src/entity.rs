//! Entity store with a two-phase delete.
//!
//! Entities move from active to trashed with [`EntityStore::soft_delete`]
//! and leave the trash either through [`EntityStore::restore`] or through
//! [`EntityStore::purge`]. Purging an active entity is refused, so permanent
//! removal always takes two deliberate steps.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::audit::{Actor, AuditLog};
use crate::error::{Error, Result};
use crate::lock;
use crate::types::{CollectionName, EntityId};

/// Short human-readable label used in audit descriptions.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Titled for String {
    fn title(&self) -> &str {
        self
    }
}

/// Stored record and its lifecycle timestamps.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity<P> {
    pub id: EntityId,
    pub collection: CollectionName,
    pub payload: P,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl<P> Entity<P> {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug)]
struct Collection<P> {
    next_seq: u64,
    rows: BTreeMap<u64, Entity<P>>,
    index: HashMap<EntityId, u64>,
}

impl<P> Default for Collection<P> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            rows: BTreeMap::new(),
            index: HashMap::new(),
        }
    }
}

impl<P> Collection<P> {
    fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity<P>> {
        let seq = self.index.get(id)?;
        self.rows.get_mut(seq)
    }
}

/// In-memory store of named collections.
///
/// Every transition on an entity runs under the store's write lock, so
/// delete, restore and purge on the same id are linearized.
#[derive(Debug)]
pub struct EntityStore<P> {
    collections: Arc<RwLock<HashMap<CollectionName, Collection<P>>>>,
    audit: AuditLog,
}

impl<P> Clone for EntityStore<P> {
    fn clone(&self) -> Self {
        Self {
            collections: Arc::clone(&self.collections),
            audit: self.audit.clone(),
        }
    }
}

fn not_found(collection: &CollectionName, id: &EntityId) -> Error {
    Error::NotFound {
        collection: collection.clone(),
        id: id.clone(),
    }
}

impl<P> EntityStore<P>
where
    P: Titled + Clone,
{
    /// Creates an empty store. Timestamps come from the audit log's clock.
    pub fn new(audit: AuditLog) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            audit,
        }
    }

    /// Stores `payload` as a new active entity.
    pub fn insert(&self, actor: &Actor, collection: &CollectionName, payload: P) -> Entity<P> {
        let mut guard = lock::write(&self.collections);
        let rows = guard.entry(collection.clone()).or_default();
        let entity = Entity {
            id: EntityId::generate(),
            collection: collection.clone(),
            payload,
            created_at: self.audit.clock().now(),
            deleted_at: None,
        };
        let seq = rows.next_seq;
        rows.next_seq += 1;
        rows.index.insert(entity.id.clone(), seq);
        rows.rows.insert(seq, entity.clone());
        self.audit.record(
            actor,
            format!(
                "inserted {}/{} \"{}\"",
                collection,
                entity.id,
                entity.payload.title()
            ),
        );
        entity
    }

    /// Edits the payload of an active entity.
    ///
    /// The mutator runs under the write lock. If it returns an error the
    /// entity is left as it was and nothing is recorded.
    pub fn update<F>(
        &self,
        actor: &Actor,
        collection: &CollectionName,
        id: &EntityId,
        mutator: F,
    ) -> Result<Entity<P>>
    where
        F: FnOnce(&P) -> Result<P>,
    {
        self.transition(actor, collection, id, |entity| {
            if entity.is_trashed() {
                return Err(Error::EntityTrashed {
                    collection: collection.clone(),
                    id: id.clone(),
                });
            }
            entity.payload = mutator(&entity.payload)?;
            Ok("updated")
        })
    }

    /// Moves an active entity to the trash.
    pub fn soft_delete(
        &self,
        actor: &Actor,
        collection: &CollectionName,
        id: &EntityId,
    ) -> Result<Entity<P>> {
        let now = self.audit.clock().now();
        self.transition(actor, collection, id, |entity| {
            if entity.is_trashed() {
                return Err(Error::AlreadyTrashed {
                    collection: collection.clone(),
                    id: id.clone(),
                });
            }
            entity.deleted_at = Some(now);
            Ok("moved to trash")
        })
    }

    /// Brings a trashed entity back to the active listing.
    pub fn restore(
        &self,
        actor: &Actor,
        collection: &CollectionName,
        id: &EntityId,
    ) -> Result<Entity<P>> {
        self.transition(actor, collection, id, |entity| {
            if !entity.is_trashed() {
                return Err(Error::NotTrashed {
                    collection: collection.clone(),
                    id: id.clone(),
                });
            }
            entity.deleted_at = None;
            Ok("restored")
        })
    }

    /// Permanently removes a trashed entity.
    pub fn purge(
        &self,
        actor: &Actor,
        collection: &CollectionName,
        id: &EntityId,
    ) -> Result<Entity<P>> {
        let mut guard = lock::write(&self.collections);
        let rows = guard
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, id))?;
        let seq = *rows
            .index
            .get(id)
            .ok_or_else(|| not_found(collection, id))?;
        let trashed = rows
            .rows
            .get(&seq)
            .is_some_and(|entity| entity.is_trashed());
        if !trashed {
            return Err(Error::NotTrashed {
                collection: collection.clone(),
                id: id.clone(),
            });
        }
        rows.index.remove(id);
        let removed = rows
            .rows
            .remove(&seq)
            .ok_or_else(|| not_found(collection, id))?;
        self.audit.record(
            actor,
            format!(
                "purged {}/{} \"{}\"",
                collection,
                id,
                removed.payload.title()
            ),
        );
        Ok(removed)
    }

    /// Returns an entity whether active or trashed.
    pub fn get(&self, collection: &CollectionName, id: &EntityId) -> Option<Entity<P>> {
        let guard = lock::read(&self.collections);
        let rows = guard.get(collection)?;
        let seq = rows.index.get(id)?;
        rows.rows.get(seq).cloned()
    }

    /// Active entities of one collection in insertion order.
    pub fn list_active(&self, collection: &CollectionName) -> Vec<Entity<P>> {
        self.list_where(collection, |entity| !entity.is_trashed())
    }

    /// Trashed entities of one collection in insertion order.
    pub fn list_trashed(&self, collection: &CollectionName) -> Vec<Entity<P>> {
        self.list_where(collection, Entity::is_trashed)
    }

    fn list_where<F>(&self, collection: &CollectionName, keep: F) -> Vec<Entity<P>>
    where
        F: Fn(&Entity<P>) -> bool,
    {
        let guard = lock::read(&self.collections);
        guard
            .get(collection)
            .map(|rows| {
                rows.rows
                    .values()
                    .filter(|entity| keep(entity))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // Runs `step` on the entity under the write lock; on success records
    // "<verb> collection/id" before the lock is released.
    fn transition<F>(
        &self,
        actor: &Actor,
        collection: &CollectionName,
        id: &EntityId,
        step: F,
    ) -> Result<Entity<P>>
    where
        F: FnOnce(&mut Entity<P>) -> Result<&'static str>,
    {
        let mut guard = lock::write(&self.collections);
        let entity = guard
            .get_mut(collection)
            .and_then(|rows| rows.get_mut(id))
            .ok_or_else(|| not_found(collection, id))?;
        let verb = step(entity).inspect_err(|err| {
            tracing::debug!(collection = %collection, id = %id, error = %err, "transition rejected");
        })?;
        let updated = entity.clone();
        self.audit.record(
            actor,
            format!(
                "{verb} {}/{} \"{}\"",
                collection,
                id,
                updated.payload.title()
            ),
        );
        Ok(updated)
    }
}
