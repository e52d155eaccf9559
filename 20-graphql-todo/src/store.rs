//! Key-value storage backing the todo service.
//!
//! The service only ever talks to the [`Store`] trait, so the in-memory map
//! used by the server can be swapped for a persistent backend or a test double.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,
    #[error("value under key `{key}` has an unexpected shape: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Untyped key-value storage.
///
/// There are no transactions: callers that read, modify and write back a key
/// must serialize those steps themselves.
pub trait Store: Send + Sync {
    /// Returns the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removes `key` entirely. Clearing an absent key is a no-op.
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed helpers layered over any [`Store`].
pub trait StoreExt: Store {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Codec {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Codec {
            key: key.to_string(),
            source,
        })?;
        self.set(key, value)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Process-lifetime map with no persistence.
///
/// Starts empty and loses everything when dropped. `BTreeMap` keeps iteration
/// order stable for debugging.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.data.lock().map_err(|_| StoreError::Poisoned)?.len())
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let data = self.data.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut data = self.data.lock().map_err(|_| StoreError::Poisoned)?;
        data.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().map_err(|_| StoreError::Poisoned)?;
        data.remove(key);
        Ok(())
    }
}
