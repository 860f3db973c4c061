//! Mood labels and detection confidence.
//!
//! Both enums are closed. Anything arriving from outside the crate (classifier
//! responses, stored blobs) goes through [`Mood::normalize`] or
//! [`Confidence::normalize`], so an unknown label can never reach the state
//! machine or the entry store.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Mood {
    Happy,
    Calm,
    Sad,
    Angry,
    Tired,
    Anxious,
    Excited,
    Neutral,
}

impl Default for Mood {
    fn default() -> Self {
        Mood::Neutral
    }
}

impl Mood {
    /// Selector order.
    pub const ALL: [Mood; 8] = [
        Mood::Happy,
        Mood::Calm,
        Mood::Sad,
        Mood::Angry,
        Mood::Tired,
        Mood::Anxious,
        Mood::Excited,
        Mood::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Calm => "calm",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Tired => "tired",
            Mood::Anxious => "anxious",
            Mood::Excited => "excited",
            Mood::Neutral => "neutral",
        }
    }

    /// Maps a raw label onto the closed set. Case and surrounding whitespace
    /// are ignored; anything unrecognized becomes `Neutral`.
    pub fn normalize(raw: &str) -> Mood {
        Self::parse(raw).unwrap_or(Mood::Neutral)
    }

    /// Strict parse, `None` for labels outside the set.
    pub fn parse(raw: &str) -> Option<Mood> {
        let lowered = raw.trim().to_ascii_lowercase();
        Mood::ALL
            .iter()
            .copied()
            .find(|mood| mood.as_str() == lowered)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Calm => "Calm",
            Mood::Sad => "Sad",
            Mood::Angry => "Angry",
            Mood::Tired => "Tired",
            Mood::Anxious => "Anxious",
            Mood::Excited => "Excited",
            Mood::Neutral => "Neutral",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Calm => "😌",
            Mood::Sad => "😢",
            Mood::Angry => "😡",
            Mood::Tired => "😴",
            Mood::Anxious => "😰",
            Mood::Excited => "🥳",
            Mood::Neutral => "😐",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mood {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Mood::normalize(&raw))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Low
    }
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }

    pub fn normalize(raw: &str) -> Confidence {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Confidence::normalize(&raw))
    }
}
