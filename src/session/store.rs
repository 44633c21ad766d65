use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::StoreError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StoreKey {
    UserId,
    ShowThx,
}

impl StoreKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::UserId => "userId",
            StoreKey::ShowThx => "showThx",
        }
    }
}

/// Typed access to the persisted session values.
///
/// `get` never fails: a missing key or a value of the wrong shape yields the
/// caller's default.
pub trait KeyValueStore {
    fn get_value(&self, key: StoreKey) -> Option<Value>;
    fn set_value(&mut self, key: StoreKey, value: Value) -> Result<(), StoreError>;

    fn get<T: DeserializeOwned>(&self, key: StoreKey, default: T) -> T {
        self.get_value(key)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(default)
    }

    fn set<T: Serialize>(&mut self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.set_value(key, value)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<&'static str, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_value(&self, key: StoreKey) -> Option<Value> {
        self.values.get(key.as_str()).cloned()
    }

    fn set_value(&mut self, key: StoreKey, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.as_str(), value);
        Ok(())
    }
}

/// JSON object on disk, rewritten atomically on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: serde_json::Map<String, Value>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let data = fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                serde_json::Map::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            serde_json::Map::new()
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "opened session store");
        Ok(Self { path, values })
    }

    fn flush(&self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&tmp, json)?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_value(&self, key: StoreKey) -> Option<Value> {
        self.values.get(key.as_str()).cloned()
    }

    fn set_value(&mut self, key: StoreKey, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.as_str().to_string(), value);
        self.flush()
    }
}

/// Backend chosen at startup.
#[derive(Debug)]
pub enum SessionStore {
    Memory(MemoryStore),
    File(JsonFileStore),
}

impl SessionStore {
    pub fn open(path: Option<&Path>) -> Result<Self, StoreError> {
        match path {
            Some(path) => Ok(SessionStore::File(JsonFileStore::open(path)?)),
            None => Ok(SessionStore::Memory(MemoryStore::new())),
        }
    }
}

impl KeyValueStore for SessionStore {
    fn get_value(&self, key: StoreKey) -> Option<Value> {
        match self {
            SessionStore::Memory(store) => store.get_value(key),
            SessionStore::File(store) => store.get_value(key),
        }
    }

    fn set_value(&mut self, key: StoreKey, value: Value) -> Result<(), StoreError> {
        match self {
            SessionStore::Memory(store) => store.set_value(key, value),
            SessionStore::File(store) => store.set_value(key, value),
        }
    }
}
