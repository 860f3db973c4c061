//! Client for the mood classification endpoint.

use std::time::Duration;

use async_trait::async_trait;
use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ClassificationError;
use crate::models::{trimmed_len, Confidence, Mood};
use crate::settings::ClassifierSettings;

/// Mirrors the service-side precondition so obviously short input never hits the network.
pub const MIN_CLASSIFY_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectionResult {
    pub mood: Mood,
    pub confidence: Confidence,
}

impl DetectionResult {
    /// Used when the service answers successfully but without a usable mood.
    pub fn fallback() -> Self {
        Self {
            mood: Mood::Neutral,
            confidence: Confidence::Low,
        }
    }
}

/// Anything that can turn free text into a mood. Implementations must not
/// retry internally; retry policy belongs to the caller.
#[async_trait]
pub trait MoodClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<DetectionResult, ClassificationError>;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

/// HTTP implementation talking to the `detect-mood` endpoint.
#[derive(Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(settings: &ClassifierSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.request_timeout_secs.max(1));
        Self::with_timeout(settings.endpoint.clone(), settings.api_key.clone(), timeout)
    }

    pub fn with_timeout(
        endpoint: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("failed to build classifier HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.filter(|url| !url.trim().is_empty()),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout,
        })
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

#[async_trait]
impl MoodClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<DetectionResult, ClassificationError> {
        if trimmed_len(text) < MIN_CLASSIFY_CHARS {
            return Err(ClassificationError::TooShort);
        }

        let Some(endpoint) = self.endpoint.as_deref() else {
            return Err(ClassificationError::ServiceUnavailable(
                "classifier endpoint is not configured".into(),
            ));
        };

        let mut request = self
            .client
            .post(endpoint)
            .header("Content-Type", "application/json")
            .json(&ClassifyRequest { text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return Err(ClassificationError::Unknown(format!(
                    "request timed out after {:?}",
                    self.timeout
                )));
            }
            Err(err) => return Err(ClassificationError::Unknown(err.to_string())),
        };

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            ClassificationError::Unknown(format!("failed to read response body: {err}"))
        })?;

        if status.is_success() {
            return parse_success_body(&body);
        }

        debug!("Classifier answered {status}");
        Err(error_for_status(status, &body))
    }
}

fn parse_success_body(body: &str) -> Result<DetectionResult, ClassificationError> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        ClassificationError::Unknown(format!("malformed classifier response: {err}"))
    })?;

    let Some(raw_mood) = value.get("mood").and_then(Value::as_str) else {
        debug!("Classifier response carried no mood, defaulting to neutral");
        return Ok(DetectionResult::fallback());
    };

    match Mood::parse(raw_mood) {
        Some(mood) => {
            let confidence = value
                .get("confidence")
                .and_then(Value::as_str)
                .map(Confidence::normalize)
                .unwrap_or_default();
            Ok(DetectionResult { mood, confidence })
        }
        None => {
            warn!("Classifier returned unknown mood '{raw_mood}', normalizing to neutral");
            Ok(DetectionResult::fallback())
        }
    }
}

fn error_for_status(status: StatusCode, body: &str) -> ClassificationError {
    let message = error_message(body);
    match status {
        StatusCode::BAD_REQUEST => ClassificationError::TooShort,
        StatusCode::PAYMENT_REQUIRED => ClassificationError::QuotaExhausted,
        StatusCode::TOO_MANY_REQUESTS => ClassificationError::RateLimited,
        StatusCode::SERVICE_UNAVAILABLE => ClassificationError::ServiceUnavailable(message),
        StatusCode::INTERNAL_SERVER_ERROR if message.contains("not configured") => {
            ClassificationError::ServiceUnavailable(message)
        }
        other => ClassificationError::Unknown(format!("{other}: {message}")),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
