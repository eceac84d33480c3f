//! Preference Storage
//!
//! Persistent key-value store holding the auth tokens and the two first-run
//! flags. Mirrors a mobile preferences API: string keys, string values.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use geosat_core::{ClientError, Result};

/// Well-known preference keys
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const FIRST_LAUNCH: &str = "firstLaunch";
    pub const POLICY_ACCEPTED: &str = "policyAccepted";
}

/// Preference store trait for persistence
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory preference store (for development/testing)
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// JSON-file preference store.
///
/// The file is read once on first access; every write rewrites it through a
/// temporary file and a rename so a crash never leaves a torn file behind.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    cache: Mutex<Option<BTreeMap<String, String>>>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ClientError::Storage(format!("corrupt preferences file {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Storage(format!("failed to create {}: {}", parent.display(), e)))?;
        }

        let bytes = serde_json::to_vec_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| ClientError::Storage(format!("failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ClientError::Storage(format!("failed to replace {}: {}", self.path.display(), e)))?;

        tracing::trace!(path = %self.path.display(), keys = values.len(), "Preferences saved");
        Ok(())
    }

    /// Apply `update` to the cached map and write it out
    async fn modify<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send,
    {
        let mut cache = self.cache.lock().await;
        let mut values = match cache.take() {
            Some(values) => values,
            None => self.load().await?,
        };
        let previous = values.clone();
        update(&mut values);
        let result = self.persist(&values).await;
        // the cache only ever reflects what is on disk
        *cache = Some(if result.is_ok() { values } else { previous });
        result
    }
}

#[async_trait]
impl PreferenceStore for FilePreferences {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(cache.as_ref().and_then(|values| values.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.modify(move |values| {
            values.insert(key, value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.modify(move |values| {
            values.remove(&key);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryPreferences::new();
        store.set(keys::ACCESS_TOKEN, "abc").await.unwrap();
        assert_eq!(store.get(keys::ACCESS_TOKEN).await.unwrap().as_deref(), Some("abc"));
        store.remove(keys::ACCESS_TOKEN).await.unwrap();
        assert!(store.get(keys::ACCESS_TOKEN).await.unwrap().is_none());
        store.remove("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("preferences.json");

        let store = FilePreferences::new(&path);
        store.set(keys::REFRESH_TOKEN, "r1").await.unwrap();
        store.set(keys::POLICY_ACCEPTED, "true").await.unwrap();
        store.remove(keys::POLICY_ACCEPTED).await.unwrap();

        let reopened = FilePreferences::new(&path);
        assert_eq!(reopened.get(keys::REFRESH_TOKEN).await.unwrap().as_deref(), Some("r1"));
        assert!(reopened.get(keys::POLICY_ACCEPTED).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferences::new(dir.path().join("nope.json"));
        assert!(store.get(keys::ACCESS_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = FilePreferences::new(&path);
        assert!(matches!(store.get("x").await, Err(ClientError::Storage(_))));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache_in_sync_with_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let store = FilePreferences::new(&path);
        store.set(keys::ACCESS_TOKEN, "a1").await.unwrap();

        // a directory in the temp file's place makes the next write fail
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let result = store.remove(keys::ACCESS_TOKEN).await;
        assert!(matches!(result, Err(ClientError::Storage(_))));

        assert_eq!(store.get(keys::ACCESS_TOKEN).await.unwrap().as_deref(), Some("a1"));
        let reopened = FilePreferences::new(&path);
        assert_eq!(reopened.get(keys::ACCESS_TOKEN).await.unwrap().as_deref(), Some("a1"));
    }
}
