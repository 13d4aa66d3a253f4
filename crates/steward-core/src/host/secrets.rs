//! Opaque key/value secret storage
//!
//! Seeded from the settings file's `globalState` block at startup; the
//! agent core reads and writes credentials through this store instead of
//! the editor's secret vault.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// In-memory secret store
#[derive(Debug, Default)]
pub struct SecretStore {
    values: RwLock<HashMap<String, Value>>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from opaque key/value pairs.
    pub fn seed(&self, entries: impl IntoIterator<Item = (String, Value)>) {
        let mut values = self.values.write();
        for (key, value) in entries {
            values.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn store(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }

    pub fn delete(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    /// Snapshot of every stored entry, for persistence at exit.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values.read().clone()
    }
}
