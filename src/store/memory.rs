//! In-memory credential store for embedding hosts and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::CredentialStore;

/// Credential store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: store `value` under `key`.
    pub fn with_token(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
    }

    /// Remove `key`. Returns the previous value, if any.
    pub fn remove(&self, key: &str) -> Option<String> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_token(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }
}
