//! Journal notes in, moods out.
//!
//! Text changes are debounced into classification requests, stale responses
//! are discarded by sequence number, and submitted notes become immutable
//! [`MoodEntry`] values in a blob-backed [`EntryStore`].

pub mod analytics;
pub mod classifier;
pub mod db;
pub mod detection;
pub mod entries;
pub mod journal;
pub mod models;
pub mod settings;
pub mod utils;

pub use analytics::{summarize, MoodSlice};
pub use classifier::{ClassificationError, DetectionResult, ErrorKind, HttpClassifier, MoodClassifier};
pub use detection::{DetectionController, DetectionSnapshot, DetectionState, SubmitError, SubmitOutcome};
pub use entries::{BlobStore, EntryStore, LoadReport, MemoryBlobStore, StoreError};
pub use journal::MoodJournal;
pub use models::{Confidence, Mood, MoodEntry};
pub use settings::JournalConfig;
pub use utils::logging::init_logging;
