//! Key-value settings storage.
//!
//! Values are arbitrary JSON. Every write replaces the whole value stored under
//! a key, so concurrent writers race only as last-writer-wins on that key.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::persistence::write_atomic;

/// Errors that can occur when reading or writing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The stored value could not be parsed, or the new value could not be encoded.
    #[error("invalid JSON for setting {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The key contains characters that are unsafe in a file name.
    #[error("invalid setting key: {0:?}")]
    InvalidKey(String),

    /// A required setting has not been configured.
    #[error("missing setting: {key}")]
    Missing { key: String },

    /// The stored value has the wrong JSON shape.
    #[error("setting {key} should be {expected}")]
    InvalidValue { key: String, expected: &'static str },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// A durable key → JSON value store.
pub trait SettingsStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Validates that a key is safe to use as a file name.
///
/// A key is unsafe if it:
/// - Is empty
/// - Contains path separators (`/` or `\`) or null bytes
/// - Starts with a dot (hidden file, or `.`/`..` traversal)
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.starts_with('.')
    {
        return Err(SettingsError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Settings stored as one JSON file per key.
///
/// ```text
/// <dir>/<key>.json      - current value
/// <dir>/<key>.json.<uuid>.tmp  - in-flight write (ignored by readers)
/// ```
///
/// Each write gets its own temp file, so concurrent writers to one key never
/// share a file and the rename of each is atomic.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    dir: PathBuf,
}

impl FileSettingsStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSettingsStore { dir: dir.into() }
    }

    /// Returns the directory holding the settings files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;

        let bytes = match std::fs::read(self.value_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| SettingsError::Json {
                key: key.to_string(),
                source,
            })
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        validate_key(key)?;

        let bytes = serde_json::to_vec_pretty(&value).map_err(|source| SettingsError::Json {
            key: key.to_string(),
            source,
        })?;
        let path = self.value_path(key);
        let tmp_path = self.dir.join(format!("{key}.json.{}.tmp", Uuid::new_v4()));
        write_atomic(&path, &tmp_path, &bytes)?;
        Ok(())
    }
}

/// Settings held in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        validate_key(key)?;
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 /_-]{0,20}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::hash_map("[a-z_]{1,8}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());

        assert_eq!(store.get("github_repo").unwrap(), None);
    }

    #[test]
    fn file_store_set_then_get() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings"));

        store.set("deploy_targets", json!({"main": "prod"})).unwrap();

        assert_eq!(
            store.get("deploy_targets").unwrap(),
            Some(json!({"main": "prod"}))
        );
    }

    #[test]
    fn file_store_last_write_wins() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());

        store.set("github_repo", json!("octocat/one")).unwrap();
        store.set("github_repo", json!("octocat/two")).unwrap();
        store.set("github_repo", json!("octocat/two")).unwrap();

        assert_eq!(store.get("github_repo").unwrap(), Some(json!("octocat/two")));
    }

    #[test]
    fn file_store_concurrent_writers_leave_a_whole_value() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());
        let long = json!({"main": "x".repeat(4000)});
        let short = json!({});

        for _ in 0..20 {
            std::thread::scope(|scope| {
                let handles: Vec<_> = (0..8)
                    .map(|i| {
                        let value = if i % 2 == 0 { long.clone() } else { short.clone() };
                        let store = &store;
                        scope.spawn(move || store.set("deploy_targets", value))
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap().unwrap();
                }
            });

            let stored = store.get("deploy_targets").unwrap();
            assert!(stored == Some(long.clone()) || stored == Some(short.clone()));
        }

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        FileSettingsStore::new(dir.path())
            .set("deploy_service_host", json!("https://deploy.example.com"))
            .unwrap();

        let reopened = FileSettingsStore::new(dir.path());
        assert_eq!(
            reopened.get("deploy_service_host").unwrap(),
            Some(json!("https://deploy.example.com"))
        );
    }

    #[test]
    fn file_store_corrupt_value_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("github_repo.json"), b"{not json").unwrap();
        let store = FileSettingsStore::new(dir.path());

        let result = store.get("github_repo");
        assert!(matches!(result, Err(SettingsError::Json { .. })));
    }

    #[test]
    fn rejects_unsafe_keys() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path());

        for key in ["", "../escape", "a/b", "a\\b", ".hidden", "..", "nul\0byte"] {
            assert!(
                matches!(store.set(key, json!(1)), Err(SettingsError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
            assert!(matches!(store.get(key), Err(SettingsError::InvalidKey(_))));
        }
    }

    #[test]
    fn memory_store_set_then_get() {
        let store = MemorySettingsStore::new();

        assert_eq!(store.get("github_repo").unwrap(), None);
        store.set("github_repo", json!("octocat/hello")).unwrap();
        assert_eq!(store.get("github_repo").unwrap(), Some(json!("octocat/hello")));
    }

    proptest! {
        /// set(k, v); get(k) == v, for the most recent v.
        #[test]
        fn prop_file_store_returns_latest_value(
            key in "[a-z][a-z_]{0,15}",
            values in prop::collection::vec(arb_json(), 1..4),
        ) {
            let dir = tempdir().unwrap();
            let store = FileSettingsStore::new(dir.path());

            for value in &values {
                store.set(&key, value.clone()).unwrap();
            }

            prop_assert_eq!(store.get(&key).unwrap(), values.last().cloned());
        }

        #[test]
        fn prop_memory_store_returns_latest_value(
            key in "[a-z][a-z_]{0,15}",
            values in prop::collection::vec(arb_json(), 1..4),
        ) {
            let store = MemorySettingsStore::new();

            for value in &values {
                store.set(&key, value.clone()).unwrap();
            }

            prop_assert_eq!(store.get(&key).unwrap(), values.last().cloned());
        }
    }
}
