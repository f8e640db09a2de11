use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::BlackboardId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("blackboard has no entry for key `{0}`")]
    MissingKey(String),

    #[error("blackboard entry `{key}` holds `{stored}`, not `{requested}`")]
    TypeMismatch {
        key: String,
        stored: &'static str,
        requested: &'static str,
    },
}

struct Entry {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Entry {
    fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }
}

fn mismatch<T: Any>(key: &str, stored: &'static str) -> BlackboardError {
    BlackboardError::TypeMismatch {
        key: key.to_string(),
        stored,
        requested: type_name::<T>(),
    }
}

/// Per-agent key/value store shared by every node of one tree instance.
///
/// An entry's type is fixed when it is created: writes and reads with any
/// other type fail without touching the stored value. Re-typing a key means
/// removing it and adding it again.
pub struct Blackboard {
    id: BlackboardId,
    entries: BTreeMap<String, Entry>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self {
            id: BlackboardId::new(),
            entries: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> BlackboardId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains_value(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Add `key` if absent, otherwise overwrite it when the stored type is `T`.
    pub fn try_add_or_update_value<T: Any + Send>(
        &mut self,
        key: &str,
        value: T,
    ) -> Result<(), BlackboardError> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                let stored = entry.type_name;
                let slot = entry
                    .value
                    .downcast_mut::<T>()
                    .ok_or_else(|| mismatch::<T>(key, stored))?;
                *slot = value;
            }
            None => {
                self.entries.insert(key.to_string(), Entry::new(value));
            }
        }
        Ok(())
    }

    pub fn try_get_value<T: Any>(&self, key: &str) -> Result<&T, BlackboardError> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| BlackboardError::MissingKey(key.to_string()))?;
        entry
            .value
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(key, entry.type_name))
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Result<&mut T, BlackboardError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| BlackboardError::MissingKey(key.to_string()))?;
        let stored = entry.type_name;
        entry
            .value
            .downcast_mut::<T>()
            .ok_or_else(|| mismatch::<T>(key, stored))
    }

    /// Shorthand for `try_get_value(key).ok()`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.try_get_value(key).ok()
    }

    pub fn try_remove_value(&mut self, key: &str) -> Result<(), BlackboardError> {
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlackboardError::MissingKey(key.to_string()))
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blackboard")
            .field("id", &self.id)
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|(k, e)| (k.as_str(), e.type_name))
                    .collect::<BTreeMap<_, _>>(),
            )
            .finish()
    }
}
