//! Mood frequency summary for the analytics chart.

use serde::Serialize;

use crate::models::{Mood, MoodEntry};

pub const EMPTY_SUMMARY_MESSAGE: &str = "Add mood entries to see your analytics";

/// Fallback color, also neutral's own.
pub const NEUTRAL_COLOR: &str = "#9BA3AF";

const MOOD_COLORS: [(Mood, &str); 8] = [
    (Mood::Happy, "#6EE7B7"),
    (Mood::Calm, "#93C5FD"),
    (Mood::Sad, "#A5B4FC"),
    (Mood::Angry, "#F87171"),
    (Mood::Tired, "#FCD34D"),
    (Mood::Anxious, "#FCA5A5"),
    (Mood::Excited, "#F472B6"),
    (Mood::Neutral, NEUTRAL_COLOR),
];

pub fn display_color(mood: Mood) -> &'static str {
    MOOD_COLORS
        .iter()
        .find(|(candidate, _)| *candidate == mood)
        .map(|(_, color)| *color)
        .unwrap_or(NEUTRAL_COLOR)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodSlice {
    pub mood: Mood,
    pub count: usize,
    pub percentage: f64,
    pub display_color: &'static str,
}

impl MoodSlice {
    /// Pie label, e.g. `Happy: 67%`.
    pub fn chart_label(&self) -> String {
        format!("{}: {:.0}%", self.mood.label(), self.percentage)
    }
}

/// Counts entries per mood. Slices come out in the order each mood first
/// appears in `entries`; an empty input gives an empty summary.
pub fn summarize(entries: &[MoodEntry]) -> Vec<MoodSlice> {
    let total = entries.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: Vec<(Mood, usize)> = Vec::new();
    for entry in entries {
        match counts.iter_mut().find(|(mood, _)| *mood == entry.mood) {
            Some((_, count)) => *count += 1,
            None => counts.push((entry.mood, 1)),
        }
    }

    counts
        .into_iter()
        .map(|(mood, count)| MoodSlice {
            mood,
            count,
            percentage: count as f64 / total as f64 * 100.0,
            display_color: display_color(mood),
        })
        .collect()
}
