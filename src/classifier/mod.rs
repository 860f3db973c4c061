pub mod client;
pub mod error;

pub use client::{DetectionResult, HttpClassifier, MoodClassifier, MIN_CLASSIFY_CHARS};
pub use error::{ClassificationError, ErrorClass, ErrorKind};
