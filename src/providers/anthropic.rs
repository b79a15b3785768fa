//! Anthropic messages-API provider.
//!
//! Same prompt contract as the OpenAI provider; the Anthropic API takes the
//! system prompt as a top-level field and returns content blocks instead of
//! chat choices.
//!
//! # Authentication
//!
//! The API key comes from the provider config, falling back to the
//! `ANTHROPIC_API_KEY` environment variable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{VerbiError, VerbiResult};
use crate::providers::prompt::{build_system_prompt, build_user_prompt, parse_model_response};
use crate::providers::{Provider, TranslationRequest, TranslationResponse};

const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic provider, as it appears in `verbi.config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnthropicConfig {
    /// Explicit API key. Falls back to `ANTHROPIC_API_KEY` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name, defaults to `claude-3-haiku-20240307`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Clone)]
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(config: &AnthropicConfig) -> VerbiResult<Self> {
        let api_key = match &config.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
                VerbiError::config(
                    "Anthropic API key missing: set provider.config.apiKey or ANTHROPIC_API_KEY",
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

    async fn messages(&self, body: serde_json::Value) -> VerbiResult<serde_json::Value> {
        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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
                VerbiError::provider_client("anthropic", format!("HTTP {status}: {error_text}"))
            } else {
                VerbiError::provider_server("anthropic", format!("HTTP {status}: {error_text}"))
            });
        }

        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
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
            "max_tokens": 4096,
            "system": build_system_prompt(
                &first.source_locale,
                &first.target_locale,
                &first.glossary,
            ),
            "messages": [
                { "role": "user", "content": build_user_prompt(requests) },
            ],
        });

        let reply = self.messages(body).await?;
        let content = reply["content"][0]["text"].as_str().ok_or_else(|| {
            VerbiError::invalid_response("anthropic", "missing content[0].text")
        })?;

        let items = parse_model_response("anthropic", content)?;
        Ok(items
            .into_iter()
            .map(|(key, text)| TranslationResponse {
                key,
                text,
                confidence: Some(0.95),
                metadata: Some(json!({ "provider": "anthropic", "model": self.model })),
            })
            .collect())
    }

    async fn validate_config(&self) -> bool {
        let body = json!({
            "model": self.model,
            "max_tokens": 10,
            "messages": [{ "role": "user", "content": "ping" }],
        });
        self.messages(body).await.is_ok()
    }
}
