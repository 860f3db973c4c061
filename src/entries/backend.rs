//! Key-value blob persistence the entry store is written against.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::db::Database;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Must replace the value for `key` atomically.
    async fn set(&self, key: &str, value: String) -> Result<()>;
}

#[async_trait]
impl BlobStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_blob(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.set_blob(key, value).await
    }
}

/// Process-local store; contents vanish with the process.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.into());
        store
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let blobs = self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(blobs.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        blobs.insert(key.to_string(), value);
        Ok(())
    }
}
