use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed outcome of a failed classification. The client never panics or
/// surfaces raw transport errors; everything folds into one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("text too short for mood detection")]
    TooShort,

    #[error("classification service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("classification rate limit exceeded")]
    RateLimited,

    #[error("classification quota exhausted")]
    QuotaExhausted,

    #[error("mood detection failed: {0}")]
    Unknown(String),
}

/// Failure category kept in the detection state. Operator detail stays in the logs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    TooShort,
    ServiceUnavailable,
    RateLimited,
    QuotaExhausted,
    Unknown,
}

/// How the presentation layer should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Transient,
    Configuration,
    Quota,
    Unknown,
}

impl ClassificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassificationError::TooShort => ErrorKind::TooShort,
            ClassificationError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            ClassificationError::RateLimited => ErrorKind::RateLimited,
            ClassificationError::QuotaExhausted => ErrorKind::QuotaExhausted,
            ClassificationError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

impl ErrorKind {
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::TooShort => ErrorClass::Validation,
            ErrorKind::RateLimited => ErrorClass::Transient,
            ErrorKind::ServiceUnavailable => ErrorClass::Configuration,
            ErrorKind::QuotaExhausted => ErrorClass::Quota,
            ErrorKind::Unknown => ErrorClass::Unknown,
        }
    }

    /// Whether trying again later can succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::Unknown)
    }

    pub fn user_title(&self) -> &'static str {
        match self {
            ErrorKind::TooShort => "Write more",
            ErrorKind::RateLimited => "Slow down",
            ErrorKind::QuotaExhausted => "Out of credits",
            ErrorKind::ServiceUnavailable | ErrorKind::Unknown => "Error",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::TooShort => "Please write at least 10 characters to detect mood",
            ErrorKind::RateLimited => "Too many requests. Please wait a moment.",
            ErrorKind::QuotaExhausted => {
                "AI service credits exhausted. Retrying will not help, please contact support."
            }
            ErrorKind::ServiceUnavailable => "Mood detection is currently unavailable.",
            ErrorKind::Unknown => "Failed to detect mood",
        }
    }
}
