//! File-backed credential store.
//!
//! Reads a flat JSON object such as `{"authToken": "\"eyJ...\"", "userId": "42"}`,
//! the layout the device-linking step writes. The file is re-read on every
//! lookup so a fresh link is picked up without restarting the relay.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::traits::CredentialStore;
use crate::error::StoreError;

/// Credential store reading a JSON key-value file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole file. A missing file is an empty store.
    pub fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    source: e,
                });
            }
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StoreError::Malformed {
                path: self.path.display().to_string(),
                reason: format!("top-level value is {}", json_kind(&other)),
            }),
            Err(e) => Err(StoreError::Malformed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get_token(&self, key: &str) -> Option<String> {
        let map = match self.load() {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "Credential store unreadable, treating as empty");
                return None;
            }
        };

        match map.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => {
                debug!(key, kind = json_kind(other), "Non-string credential value");
                Some(other.to_string())
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(contents: &str) -> (FileCredentialStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, contents).unwrap();
        (FileCredentialStore::new(path), dir)
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nope.json"));
        assert!(store.get_token("authToken").is_none());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn reads_string_value_verbatim() {
        let (store, _dir) = store_with(r#"{"authToken": "\"abc123\"", "userId": "u1"}"#);
        assert_eq!(store.get_token("authToken").as_deref(), Some("\"abc123\""));
        assert_eq!(store.get_token("userId").as_deref(), Some("u1"));
        assert!(store.get_token("setupComplete").is_none());
    }

    #[test]
    fn null_value_is_absent() {
        let (store, _dir) = store_with(r#"{"authToken": null}"#);
        assert!(store.get_token("authToken").is_none());
    }

    #[test]
    fn malformed_file_is_treated_as_empty() {
        let (store, _dir) = store_with("not json");
        assert!(matches!(store.load(), Err(StoreError::Malformed { .. })));
        assert!(store.get_token("authToken").is_none());
    }

    #[test]
    fn array_file_is_malformed() {
        let (store, _dir) = store_with("[1, 2]");
        assert!(matches!(store.load(), Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn picks_up_rewrites_without_reopen() {
        let (store, _dir) = store_with("{}");
        assert!(store.get_token("authToken").is_none());

        std::fs::write(store.path(), r#"{"authToken": "fresh"}"#).unwrap();
        assert_eq!(store.get_token("authToken").as_deref(), Some("fresh"));
    }
}
