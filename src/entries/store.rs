use std::sync::Arc;

use log::{error, info, warn};
use thiserror::Error;
use tokio::sync::Mutex;

use super::BlobStore;
use crate::models::MoodEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored entries under '{key}' could not be decoded: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("an entry with id {0} already exists")]
    DuplicateId(String),

    #[error("failed to encode entries: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Result of [`EntryStore::load`]. Loading never fails outright; a blob that
/// cannot be read or decoded yields an empty list plus the reason.
#[derive(Debug)]
pub struct LoadReport {
    pub entries: Vec<MoodEntry>,
    pub recovered: Option<StoreError>,
}

/// Newest-first list of finalized entries, persisted as one JSON blob.
///
/// Every mutation holds the lock across a read-modify-write of the blob, and
/// the in-memory list is only swapped once the write has succeeded.
#[derive(Clone)]
pub struct EntryStore {
    backend: Arc<dyn BlobStore>,
    key: Arc<str>,
    /// `None` until the blob has been read successfully (or found corrupt).
    entries: Arc<Mutex<Option<Vec<MoodEntry>>>>,
}

impl EntryStore {
    pub fn new(backend: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: Arc::from(key.into()),
            entries: Arc::new(Mutex::new(None)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn load(&self) -> LoadReport {
        let mut guard = self.entries.lock().await;

        let (entries, recovered) = match self.read_blob().await {
            Ok(entries) => {
                *guard = Some(entries.clone());
                (entries, None)
            }
            Err(err @ StoreError::Corrupt { .. }) => {
                warn!("Discarding unreadable entries under '{}': {err}", self.key);
                *guard = Some(Vec::new());
                (Vec::new(), Some(err))
            }
            Err(err) => {
                // Leave the cache unloaded so later writes re-read instead of
                // clobbering entries we could not see.
                error!("Failed to load entries under '{}': {err:#}", self.key);
                *guard = None;
                (Vec::new(), Some(err))
            }
        };

        info!("Loaded {} mood entries", entries.len());
        LoadReport { entries, recovered }
    }

    /// Entries as of the last successful load or write. Empty before that.
    pub async fn list(&self) -> Vec<MoodEntry> {
        self.entries.lock().await.clone().unwrap_or_default()
    }

    pub async fn add(&self, entry: MoodEntry) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().await;
        let current = self.current(&mut guard).await?;
        if current.iter().any(|existing| existing.id == entry.id) {
            return Err(StoreError::DuplicateId(entry.id));
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(entry);
        next.extend(current);

        self.persist(&next).await?;
        *guard = Some(next);
        Ok(())
    }

    /// Removes the entry if present. Returns whether anything was removed;
    /// deleting an unknown id is not an error.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut guard = self.entries.lock().await;
        let current = self.current(&mut guard).await?;
        if !current.iter().any(|entry| entry.id == id) {
            return Ok(false);
        }

        let next: Vec<MoodEntry> = current.into_iter().filter(|entry| entry.id != id).collect();
        self.persist(&next).await?;
        *guard = Some(next);
        Ok(true)
    }

    /// Cached entries, reading the blob first if nothing has been loaded.
    /// A corrupt blob counts as empty; a failed read is returned as an error.
    async fn current(
        &self,
        cache: &mut Option<Vec<MoodEntry>>,
    ) -> Result<Vec<MoodEntry>, StoreError> {
        if let Some(entries) = cache.as_ref() {
            return Ok(entries.clone());
        }

        let entries = match self.read_blob().await {
            Ok(entries) => entries,
            Err(err @ StoreError::Corrupt { .. }) => {
                warn!("Replacing unreadable entries under '{}': {err}", self.key);
                Vec::new()
            }
            Err(err) => {
                error!("Refusing to write entries under '{}': {err:#}", self.key);
                return Err(err);
            }
        };
        *cache = Some(entries.clone());
        Ok(entries)
    }

    async fn read_blob(&self) -> Result<Vec<MoodEntry>, StoreError> {
        let Some(raw) = self.backend.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: self.key.to_string(),
            source,
        })
    }

    async fn persist(&self, entries: &[MoodEntry]) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(entries).map_err(StoreError::Encode)?;
        self.backend.set(&self.key, serialized).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::MemoryBlobStore;
    use crate::models::Mood;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn entry(mood: Mood, note: &str) -> MoodEntry {
        MoodEntry::new(mood, note).unwrap()
    }

    fn memory_store() -> EntryStore {
        EntryStore::new(Arc::new(MemoryBlobStore::new()), "moodEntries")
    }

    struct FlakyBlobStore {
        inner: MemoryBlobStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl FlakyBlobStore {
        fn new(inner: MemoryBlobStore) -> Self {
            Self {
                inner,
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl BlobStore for FlakyBlobStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(anyhow!("connection reset"));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(anyhow!("disk full"));
            }
            self.inner.set(key, value).await
        }
    }

    #[tokio::test]
    async fn add_then_load_returns_entry_first() {
        let store = memory_store();
        let older = entry(Mood::Sad, "gloomy afternoon at work");
        let newer = entry(Mood::Happy, "I had a wonderful day at the park");

        store.add(older.clone()).await.unwrap();
        store.add(newer.clone()).await.unwrap();

        let report = store.load().await;
        assert!(report.recovered.is_none());
        assert_eq!(report.entries, vec![newer, older]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = memory_store();
        let keep = entry(Mood::Calm, "quiet tea on the porch");
        let gone = entry(Mood::Angry, "stuck in traffic for hours");
        store.add(keep.clone()).await.unwrap();
        store.add(gone.clone()).await.unwrap();

        assert!(store.delete(&gone.id).await.unwrap());
        let once = store.load().await.entries;
        assert!(!store.delete(&gone.id).await.unwrap());
        let twice = store.load().await.entries;

        assert_eq!(once, vec![keep]);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn corrupt_blob_loads_empty_with_recoverable_error() {
        let backend = MemoryBlobStore::with_blob("moodEntries", "{ definitely not a list");
        let store = EntryStore::new(Arc::new(backend), "moodEntries");

        let report = store.load().await;
        assert!(report.entries.is_empty());
        assert!(matches!(report.recovered, Some(StoreError::Corrupt { .. })));

        store.add(entry(Mood::Tired, "long night with the baby")).await.unwrap();
        assert_eq!(store.load().await.entries.len(), 1);
    }

    #[tokio::test]
    async fn stored_unknown_moods_normalize_to_neutral() {
        let blob = r#"[{"id":"a1","mood":"melancholy","note":"staring at the rain","created_at":"2025-03-04T21:05:00Z"}]"#;
        let store = EntryStore::new(Arc::new(MemoryBlobStore::with_blob("moodEntries", blob)), "moodEntries");

        let report = store.load().await;
        assert_eq!(report.entries[0].mood, Mood::Neutral);
        assert_eq!(report.entries[0].id, "a1");
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_and_blob_untouched() {
        let backend = Arc::new(FlakyBlobStore::new(MemoryBlobStore::new()));
        let store = EntryStore::new(backend.clone(), "moodEntries");
        let first = entry(Mood::Excited, "concert tickets arrived today");
        store.add(first.clone()).await.unwrap();

        backend.fail_writes.store(true, Ordering::SeqCst);
        let err = store
            .add(entry(Mood::Anxious, "exam results come out tomorrow"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.delete(&first.id).await.is_err());

        assert_eq!(store.list().await, vec![first.clone()]);
        assert_eq!(store.load().await.entries, vec![first]);
    }

    #[tokio::test]
    async fn add_before_load_keeps_stored_entries() {
        let backend: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let earlier = EntryStore::new(backend.clone(), "moodEntries");
        let first = entry(Mood::Calm, "slow morning with coffee");
        let second = entry(Mood::Happy, "finished the puzzle at last");
        earlier.add(first.clone()).await.unwrap();
        earlier.add(second.clone()).await.unwrap();

        let fresh = EntryStore::new(backend, "moodEntries");
        let third = entry(Mood::Tired, "too many errands in one day");
        fresh.add(third.clone()).await.unwrap();

        assert_eq!(fresh.list().await, vec![third.clone(), second.clone(), first.clone()]);
        assert_eq!(fresh.load().await.entries, vec![third, second, first]);
    }

    #[tokio::test]
    async fn delete_before_load_keeps_other_entries() {
        let backend: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let earlier = EntryStore::new(backend.clone(), "moodEntries");
        let keep = entry(Mood::Sad, "missing my old friends");
        let gone = entry(Mood::Angry, "printer jammed again");
        earlier.add(keep.clone()).await.unwrap();
        earlier.add(gone.clone()).await.unwrap();

        let fresh = EntryStore::new(backend, "moodEntries");
        assert!(fresh.delete(&gone.id).await.unwrap());
        assert_eq!(fresh.load().await.entries, vec![keep]);
    }

    #[tokio::test]
    async fn read_failure_blocks_writes_until_blob_is_readable() {
        let seeded = EntryStore::new(Arc::new(MemoryBlobStore::new()), "moodEntries");
        let first = entry(Mood::Happy, "picnic in the botanical garden");
        let second = entry(Mood::Calm, "evening yoga by the window");
        seeded.add(first.clone()).await.unwrap();
        seeded.add(second.clone()).await.unwrap();
        let blob = serde_json::to_string(&seeded.list().await).unwrap();

        let backend = Arc::new(FlakyBlobStore::new(MemoryBlobStore::with_blob(
            "moodEntries",
            &blob,
        )));
        backend.fail_reads.store(true, Ordering::SeqCst);
        let store = EntryStore::new(backend.clone(), "moodEntries");

        let report = store.load().await;
        assert!(report.entries.is_empty());
        assert!(matches!(report.recovered, Some(StoreError::Backend(_))));

        let third = entry(Mood::Excited, "booked flights for the summer");
        let err = store.add(third.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.delete(&first.id).await.is_err());

        backend.fail_reads.store(false, Ordering::SeqCst);
        store.add(third.clone()).await.unwrap();
        assert_eq!(store.load().await.entries, vec![third, second, first]);
    }

    #[tokio::test]
    async fn rejects_duplicate_ids() {
        let store = memory_store();
        let e = entry(Mood::Happy, "sunny walk by the river");
        store.add(e.clone()).await.unwrap();
        assert!(matches!(store.add(e).await, Err(StoreError::DuplicateId(_))));
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn sqlite_backend_round_trips_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = crate::db::Database::new(dir.path().join("journal.sqlite3")).unwrap();
        let store = EntryStore::new(Arc::new(db.clone()), "moodEntries");
        let e = entry(Mood::Calm, "meditated for twenty minutes");
        store.add(e.clone()).await.unwrap();

        let reopened = EntryStore::new(Arc::new(db), "moodEntries");
        assert_eq!(reopened.load().await.entries, vec![e]);
    }
}
