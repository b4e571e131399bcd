//! Identifier registry for the named entities of a Model.
//!
//! Networks and scenarios share one namespace. Every mutation takes the
//! single registry lock, and the lock is held only for the map update.

use casebook_domain::ScenarioKey;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

/// Registry error
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// Id already taken by another entity
    #[error("Identifier already in use: {0}")]
    Conflict(String),

    /// Id is not registered to the calling entity
    #[error("Identifier not registered: {0}")]
    NotRegistered(String),

    /// Id cannot be used
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

/// Which entity owns an id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// A network (networks are identified by their id alone)
    Network,
    /// A scenario, by its stable key
    Scenario(ScenarioKey),
}

impl EntityKey {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKey::Network => "network",
            EntityKey::Scenario(_) => "scenario",
        }
    }
}

/// Uniqueness-enforcing name table shared by all named entities of a Model
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    entries: Mutex<HashMap<String, EntityKey>>,
}

impl IdentifierRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single map operation, so a poisoned lock still
    // guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, EntityKey>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_id(id: &str) -> Result<(), RegistryError> {
        if id.trim().is_empty() {
            return Err(RegistryError::InvalidId("identifier cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Register an id for an entity
    pub fn register(&self, id: &str, key: EntityKey) -> Result<(), RegistryError> {
        Self::check_id(id)?;

        let mut entries = self.lock();
        if entries.contains_key(id) {
            return Err(RegistryError::Conflict(id.to_string()));
        }
        entries.insert(id.to_string(), key);
        debug!("Registered {} `{}`", key.as_str(), id);
        Ok(())
    }

    /// Remove an id, only if it belongs to `key`
    ///
    /// Returns whether anything was removed.
    pub fn unregister(&self, id: &str, key: EntityKey) -> bool {
        let mut entries = self.lock();
        if entries.get(id) == Some(&key) {
            entries.remove(id);
            debug!("Unregistered {} `{}`", key.as_str(), id);
            true
        } else {
            false
        }
    }

    /// Move an entity from `old` to `new` in one step
    ///
    /// Either the old id is removed and the new id added, or nothing changes.
    /// Renaming to the current id is a successful no-op.
    pub fn rename(&self, old: &str, new: &str, key: EntityKey) -> Result<(), RegistryError> {
        Self::check_id(new)?;

        let mut entries = self.lock();
        if entries.get(old) != Some(&key) {
            return Err(RegistryError::NotRegistered(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if entries.contains_key(new) {
            return Err(RegistryError::Conflict(new.to_string()));
        }

        entries.remove(old);
        entries.insert(new.to_string(), key);
        debug!("Renamed {} `{}` to `{}`", key.as_str(), old, new);
        Ok(())
    }

    /// Owner of an id
    pub fn lookup(&self, id: &str) -> Option<EntityKey> {
        self.lock().get(id).copied()
    }

    /// Check if an id is taken
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of registered ids
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registered scenario ids, sorted
    pub fn scenario_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, key)| matches!(key, EntityKey::Scenario(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}
