//! Key/value persistence for the session record.
//!
//! Values are plain strings, mirroring browser local storage. The file backend
//! keeps a flat JSON object in `<base>/session.json` with restricted
//! permissions (0600). Tokens are never logged.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::{self, paths};

/// Owner read/write only; the file holds a bearer token.
const SESSION_FILE_MODE: u32 = 0o600;

/// Key holding the JSON-serialized user record.
pub const USER_KEY: &str = "currentUser";
/// Key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

/// String-valued persistent storage shared by the session store and gateways.
pub trait SessionStorage: Send + Sync {
    /// Returns the value for `key`, or `None` when unset.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory storage for tests and embedding. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// File-backed storage. Every call re-reads the file so external edits are
/// picked up, the same way a browser re-reads local storage.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Storage at the default location under `CATALOG_HOME`.
    pub fn at_default_path() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(entries).context("Failed to serialize session")?;
        config::write_atomic(&self.path, &contents, Some(SESSION_FILE_MODE))
    }

    /// Read-modify-write under the lock. An unreadable file is replaced by
    /// whatever `apply` leaves in an empty map.
    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut entries, repair) = match self.load() {
            Ok(entries) => (entries, false),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "discarding unreadable session file");
                (BTreeMap::new(), true)
            }
        };
        if apply(&mut entries) || repair {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);

        storage.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        storage.remove(TOKEN_KEY).unwrap();
        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));

        assert_eq!(storage.get(USER_KEY).unwrap(), None);
        storage.remove(USER_KEY).unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let storage = FileStorage::new(&path);
        storage.set(USER_KEY, r#"{"nombre":"Ana"}"#).unwrap();
        storage.set(TOKEN_KEY, "t-1").unwrap();
        drop(storage);

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get(USER_KEY).unwrap().as_deref(),
            Some(r#"{"nombre":"Ana"}"#)
        );
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("t-1"));

        reopened.remove(USER_KEY).unwrap();
        assert_eq!(FileStorage::new(&path).get(USER_KEY).unwrap(), None);
        assert_eq!(
            FileStorage::new(&path).get(TOKEN_KEY).unwrap().as_deref(),
            Some("t-1")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));
        storage.set(TOKEN_KEY, "secret").unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, SESSION_FILE_MODE);
    }

    #[test]
    fn test_file_storage_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        assert!(FileStorage::new(&path).get(TOKEN_KEY).is_err());
    }

    #[test]
    fn test_file_storage_write_replaces_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{truncated").unwrap();

        let storage = FileStorage::new(&path);
        storage.set(TOKEN_KEY, "t").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("t"));
        assert_eq!(reopened.get(USER_KEY).unwrap(), None);
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_remove_clears_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::new(&path);
        storage.remove(USER_KEY).unwrap();

        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }
}
