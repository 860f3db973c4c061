use serde::{Deserialize, Serialize};

use crate::classifier::ErrorKind;
use crate::models::{note_hint, Confidence, Mood};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DetectionState {
    Idle,
    Detecting { sequence: u64 },
    Detected { mood: Mood, confidence: Confidence },
    Failed { kind: ErrorKind },
}

impl Default for DetectionState {
    fn default() -> Self {
        DetectionState::Idle
    }
}

impl DetectionState {
    pub fn is_detecting(&self) -> bool {
        matches!(self, DetectionState::Detecting { .. })
    }

    pub fn detected_mood(&self) -> Option<Mood> {
        match self {
            DetectionState::Detected { mood, .. } => Some(*mood),
            _ => None,
        }
    }
}

/// One classification call in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRequest {
    pub sequence: u64,
    pub text: String,
}

/// What the presentation layer renders for the input form.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSnapshot {
    pub state: DetectionState,
    pub note: String,
    pub hint: String,
    pub latest_sequence: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ControllerState {
    pub note: String,
    pub detection: DetectionState,
    /// Highest sequence number issued so far.
    pub latest_sequence: u64,
    /// Text sent with the latest request.
    pub classified_text: String,
}

impl ControllerState {
    pub fn issue(&mut self, text: String) -> DetectionRequest {
        self.latest_sequence += 1;
        self.classified_text.clone_from(&text);
        self.detection = DetectionState::Detecting {
            sequence: self.latest_sequence,
        };
        DetectionRequest {
            sequence: self.latest_sequence,
            text,
        }
    }

    /// Only the newest request may settle the state, and only while it is
    /// still the one being waited on.
    pub fn accepts(&self, sequence: u64) -> bool {
        sequence == self.latest_sequence
            && self.detection == DetectionState::Detecting { sequence }
    }

    /// The detected mood, if it was computed for the note as it stands now.
    pub fn mood_for_note(&self) -> Option<Mood> {
        self.detection
            .detected_mood()
            .filter(|_| self.classified_text == self.note)
    }

    pub fn reset(&mut self) {
        self.note.clear();
        self.classified_text.clear();
        self.detection = DetectionState::Idle;
    }

    pub fn snapshot(&self) -> DetectionSnapshot {
        DetectionSnapshot {
            state: self.detection,
            note: self.note.clone(),
            hint: note_hint(&self.note),
            latest_sequence: self.latest_sequence,
        }
    }
}
