use std::sync::{Arc, RwLock};

use crate::audit::{Actor, AuditLog};
use crate::error::{Error, Result};
use crate::lock;

/// Machinery categories offered out of the box.
pub const DEFAULT_CATEGORIES: [&str; 9] = [
    "excavator",
    "bulldozer",
    "loader",
    "dump-truck",
    "roller",
    "crane",
    "tipper",
    "mixer",
    "concrete-pump",
];

/// Ordered list of unique, free-text category names.
#[derive(Debug, Clone)]
pub struct Categories {
    names: Arc<RwLock<Vec<String>>>,
    audit: AuditLog,
}

fn normalize(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "category name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

impl Categories {
    /// Creates a list seeded with `initial`; blank and repeated names are skipped.
    pub fn new<I, T>(audit: AuditLog, initial: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in initial {
            if let Ok(name) = normalize(name.as_ref())
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        Self {
            names: Arc::new(RwLock::new(names)),
            audit,
        }
    }

    pub fn add(&self, actor: &Actor, name: &str) -> Result<String> {
        let name = normalize(name)?;
        let mut guard = lock::write(&self.names);
        if guard.contains(&name) {
            return Err(Error::DuplicateCategory(name));
        }
        guard.push(name.clone());
        self.audit
            .record(actor, format!("added category \"{name}\""));
        Ok(name)
    }

    pub fn remove(&self, actor: &Actor, name: &str) -> Result<String> {
        let trimmed = name.trim();
        let mut guard = lock::write(&self.names);
        let index = guard
            .iter()
            .position(|existing| existing == trimmed)
            .ok_or_else(|| Error::CategoryNotFound(trimmed.to_string()))?;
        let removed = guard.remove(index);
        self.audit
            .record(actor, format!("deleted category \"{removed}\""));
        Ok(removed)
    }

    pub fn contains(&self, name: &str) -> bool {
        lock::read(&self.names)
            .iter()
            .any(|existing| existing == name.trim())
    }

    pub fn list(&self) -> Vec<String> {
        lock::read(&self.names).clone()
    }
}
