//! Persistent key-value storage for the session record
//!
//! The token and the user profile are stored together under a single key so
//! that they can never drift apart.

use crate::user::UserProfile;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use daraja_core::{storage_error, DarajaResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// The persisted session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: String,
    pub user: UserProfile,
}

impl PersistedSession {
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn to_json(&self) -> SessionResult<String> {
        serde_json::to_string(self).map_err(|e| SessionError::malformed(e.to_string()))
    }

    pub fn from_json(raw: &str) -> SessionResult<Self> {
        serde_json::from_str(raw).map_err(|e| SessionError::malformed(e.to_string()))
    }
}

/// Persistent string storage, the native analogue of browser local storage
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent
    async fn get(&self, key: &str) -> DarajaResult<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> DarajaResult<()>;

    /// Remove a value; removing an absent key succeeds
    async fn remove(&self, key: &str) -> DarajaResult<()>;
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> DarajaResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DarajaResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> DarajaResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// File-backed store keeping one JSON file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create the store, creating the directory if needed
    pub async fn open<P: AsRef<Path>>(dir: P) -> DarajaResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            storage_error!(
                format!("Failed to create storage directory {}: {}", dir.display(), e),
                "file_store",
                e
            )
        })?;

        debug!("File store initialized at: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: &str) -> DarajaResult<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error!(
                format!("Failed to read {}: {}", path.display(), e),
                "file_store",
                e
            )),
        }
    }

    async fn set(&self, key: &str, value: &str) -> DarajaResult<()> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, value).await.map_err(|e| {
            storage_error!(
                format!("Failed to write {}: {}", tmp_path.display(), e),
                "file_store",
                e
            )
        })?;

        // Rename so readers never observe a half-written record
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            storage_error!(
                format!("Failed to replace {}: {}", path.display(), e),
                "file_store",
                e
            )
        })?;

        debug!("Stored key {} at {}", key, path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> DarajaResult<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error!(
                format!("Failed to remove {}: {}", path.display(), e),
                "file_store",
                e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let view = store.clone();

        store.set("daraja.session", "{}").await.unwrap();
        assert_eq!(view.get("daraja.session").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(view.len().await, 1);

        view.remove("daraja.session").await.unwrap();
        assert!(store.is_empty().await);
        store.remove("daraja.session").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("storage")).await.unwrap();

        assert_eq!(store.get("daraja.session").await.unwrap(), None);

        store.set("daraja.session", "first").await.unwrap();
        store.set("daraja.session", "second").await.unwrap();
        assert_eq!(
            store.get("daraja.session").await.unwrap().as_deref(),
            Some("second")
        );
        assert!(store.dir().join("daraja.session.json").exists());

        store.remove("daraja.session").await.unwrap();
        assert_eq!(store.get("daraja.session").await.unwrap(), None);
        store.remove("daraja.session").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.set("../escape/attempt", "value").await.unwrap();
        assert!(dir.path().join(".._escape_attempt.json").exists());
    }

    #[test]
    fn test_persisted_session_rejects_garbage() {
        assert!(matches!(
            PersistedSession::from_json("not json"),
            Err(SessionError::MalformedSessionData { .. })
        ));
        assert!(matches!(
            PersistedSession::from_json(r#"{"token": "abc"}"#),
            Err(SessionError::MalformedSessionData { .. })
        ));
    }
}
