use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::watch;

use crate::{
    analytics::{summarize, MoodSlice},
    classifier::{HttpClassifier, MoodClassifier},
    db::Database,
    detection::{DetectionController, DetectionSnapshot, DetectionState, SubmitError, SubmitOutcome},
    entries::{BlobStore, EntryStore, LoadReport, StoreError},
    models::MoodEntry,
    settings::JournalConfig,
    utils::logging::init_logging,
};

pub const EMPTY_LIST_MESSAGE: &str = "No mood entries yet. Start by adding your first entry!";

/// Everything the presentation layer talks to.
pub struct MoodJournal {
    controller: DetectionController,
    store: EntryStore,
}

impl MoodJournal {
    /// Opens the SQLite store at the configured path, wires the HTTP
    /// classifier, and loads existing entries. Must be called inside a tokio
    /// runtime.
    pub async fn open(config: &JournalConfig) -> Result<(Self, LoadReport)> {
        init_logging(config.debug);

        let database = Database::new(config.storage.database_path.clone())
            .context("failed to open journal database")?;
        let classifier = HttpClassifier::new(&config.classifier)?;
        if classifier.endpoint().is_none() {
            warn!("No classifier endpoint configured; mood detection will be unavailable");
        }

        let journal = Self::with_parts(
            Arc::new(classifier),
            Arc::new(database),
            &config.storage.entries_key,
            Duration::from_millis(config.debounce.quiet_period_ms),
        );
        let report = journal.reload().await;

        info!("Mood journal ready with {} entries", report.entries.len());
        Ok((journal, report))
    }

    /// Wires the journal from explicit collaborators. Entries are not loaded;
    /// call [`MoodJournal::reload`].
    pub fn with_parts(
        classifier: Arc<dyn MoodClassifier>,
        backend: Arc<dyn BlobStore>,
        entries_key: &str,
        quiet_period: Duration,
    ) -> Self {
        let store = EntryStore::new(backend, entries_key);
        let controller = DetectionController::new(classifier, store.clone(), quiet_period);
        Self { controller, store }
    }

    pub async fn reload(&self) -> LoadReport {
        self.store.load().await
    }

    pub async fn on_text_change(&self, text: &str) {
        self.controller.on_text_change(text).await;
    }

    pub async fn submit_note(&self, text: &str) -> Result<SubmitOutcome, SubmitError> {
        self.controller.submit_note(text).await
    }

    pub async fn current_detection_state(&self) -> DetectionSnapshot {
        self.controller.snapshot().await
    }

    pub fn subscribe(&self) -> watch::Receiver<DetectionState> {
        self.controller.subscribe()
    }

    pub async fn list_entries(&self) -> Vec<MoodEntry> {
        self.store.list().await
    }

    pub async fn delete_entry(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.store.delete(id).await?;
        if removed {
            info!("Deleted mood entry {id}");
        }
        Ok(removed)
    }

    pub async fn mood_summary(&self) -> Vec<MoodSlice> {
        summarize(&self.store.list().await)
    }
}

impl Drop for MoodJournal {
    fn drop(&mut self) {
        self.controller.shutdown();
    }
}
