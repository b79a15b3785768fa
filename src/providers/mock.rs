//! Mock translation provider for tests and offline runs.
//!
//! Deterministic and free: echoes the source text back, optionally marked
//! with a suffix so callers can tell translated output apart from input.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{VerbiError, VerbiResult};
use crate::providers::{Provider, TranslationRequest, TranslationResponse};

/// Configuration for the mock provider, as it appears in `verbi.config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockConfig {
    /// Appended to every translation, e.g. `"[fr]"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// When true every `translate` call fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail: Option<bool>,
    /// Artificial latency per call, for exercising timeouts and progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

/// How the mock produces its "translations".
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Return the source text unchanged.
    #[default]
    Echo,
    /// Return the source text with a suffix appended.
    Suffix(String),
    /// Look the source text up in a fixed table, echo on miss.
    Mappings(HashMap<String, String>),
    /// Fail every call with the given message.
    Error(String),
}

pub struct MockProvider {
    mode: MockMode,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(mode: MockMode) -> Self {
        MockProvider {
            mode,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &MockConfig) -> Self {
        let mode = if config.fail == Some(true) {
            MockMode::Error("mock provider configured to fail".to_string())
        } else if let Some(suffix) = &config.suffix {
            MockMode::Suffix(suffix.clone())
        } else {
            MockMode::Echo
        };
        MockProvider {
            mode,
            delay: config.delay_ms.map(Duration::from_millis),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `translate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn translate(
        &self,
        requests: &[TranslationRequest],
    ) -> VerbiResult<Vec<TranslationResponse>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let responses = requests
            .iter()
            .map(|request| {
                let text = match &self.mode {
                    MockMode::Echo => request.source_text.clone(),
                    MockMode::Suffix(suffix) => format!("{} {suffix}", request.source_text),
                    MockMode::Mappings(table) => table
                        .get(&request.source_text)
                        .cloned()
                        .unwrap_or_else(|| request.source_text.clone()),
                    MockMode::Error(message) => {
                        return Err(VerbiError::provider_server("mock", message.clone()));
                    }
                };
                Ok(TranslationResponse {
                    key: request.key.clone(),
                    text,
                    confidence: Some(1.0),
                    metadata: None,
                })
            })
            .collect::<VerbiResult<Vec<_>>>()?;
        Ok(responses)
    }

    async fn validate_config(&self) -> bool {
        !matches!(self.mode, MockMode::Error(_))
    }
}
