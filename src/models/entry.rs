use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Mood;

/// Minimum trimmed note length, in characters, before a note is classified or saved.
pub const MIN_NOTE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("note must be at least {MIN_NOTE_CHARS} characters (got {actual})")]
pub struct NoteTooShort {
    pub actual: usize,
}

pub fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}

pub fn is_classifiable(text: &str) -> bool {
    trimmed_len(text) >= MIN_NOTE_CHARS
}

/// Helper line shown under the note input.
pub fn note_hint(text: &str) -> String {
    let len = trimmed_len(text);
    if len < MIN_NOTE_CHARS {
        format!("Write at least {} more characters", MIN_NOTE_CHARS - len)
    } else {
        "AI is analyzing your mood...".to_string()
    }
}

/// A finalized journal entry. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodEntry {
    pub id: String,
    pub mood: Mood,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl MoodEntry {
    pub fn new(mood: Mood, note: &str) -> Result<Self, NoteTooShort> {
        Self::with_timestamp(mood, note, Utc::now())
    }

    pub fn with_timestamp(
        mood: Mood,
        note: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, NoteTooShort> {
        let note = note.trim();
        let actual = note.chars().count();
        if actual < MIN_NOTE_CHARS {
            return Err(NoteTooShort { actual });
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            mood,
            note: note.to_string(),
            created_at,
        })
    }

    /// e.g. `Mar 04, 2025 at 9:05 PM`, in local time.
    pub fn display_timestamp(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%b %d, %Y at %-I:%M %p")
            .to_string()
    }
}
