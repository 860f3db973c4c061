pub mod entry;
pub mod mood;

pub use entry::{is_classifiable, note_hint, trimmed_len, MoodEntry, NoteTooShort, MIN_NOTE_CHARS};
pub use mood::{Confidence, Mood};
