//! OpenAI chat-completions provider.
//!
//! Sends each batch as a single chat completion with JSON output forced via
//! `response_format`, then parses the reply into per-key translations.
//!
//! # Authentication
//!
//! The API key comes from the provider config, falling back to the
//! `OPENAI_API_KEY` environment variable.
//!
//! # Example
//!
//! ```ignore
//! use verbi::providers::{OpenAiConfig, OpenAiProvider, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAiProvider::new(&OpenAiConfig::default())?;
//!     let responses = provider.translate(&requests).await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{VerbiError, VerbiResult};
use crate::providers::prompt::{build_system_prompt, build_user_prompt, parse_model_response};
use crate::providers::{Provider, TranslationRequest, TranslationResponse};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI provider, as it appears in `verbi.config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    /// Explicit API key. Falls back to `OPENAI_API_KEY` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name, defaults to `gpt-4o-mini`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Override for the API base URL, e.g. an Azure or proxy endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a provider from config, resolving the key against the environment.
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(VerbiError)` - If no API key is available or HTTP client creation fails
    pub fn new(config: &OpenAiConfig) -> VerbiResult<Self> {
        let api_key = match &config.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => std::env::var("OPENAI_API_KEY").map_err(|_| {
                VerbiError::config(
                    "OpenAI API key missing: set provider.config.apiKey or OPENAI_API_KEY",
                )
            })?,
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            api_key,
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn chat(&self, body: serde_json::Value) -> VerbiResult<serde_json::Value> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(if status.is_client_error() {
                VerbiError::provider_client("openai", format!("HTTP {status}: {error_text}"))
            } else {
                VerbiError::provider_server("openai", format!("HTTP {status}: {error_text}"))
            });
        }

        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn translate(
        &self,
        requests: &[TranslationRequest],
    ) -> VerbiResult<Vec<TranslationResponse>> {
        let Some(first) = requests.first() else {
            return Ok(Vec::new());
        };

        let body = json!({
            "model": self.model,
            "temperature": 0.3,
            "response_format": { "type": "json_object" },
            "messages": [
                {
                    "role": "system",
                    "content": build_system_prompt(
                        &first.source_locale,
                        &first.target_locale,
                        &first.glossary,
                    ),
                },
                { "role": "user", "content": build_user_prompt(requests) },
            ],
        });

        let reply = self.chat(body).await?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                VerbiError::invalid_response("openai", "missing choices[0].message.content")
            })?;

        let items = parse_model_response("openai", content)?;
        Ok(items
            .into_iter()
            .map(|(key, text)| TranslationResponse {
                key,
                text,
                confidence: Some(0.95),
                metadata: Some(json!({ "provider": "openai", "model": self.model })),
            })
            .collect())
    }

    async fn validate_config(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
