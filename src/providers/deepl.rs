//! DeepL API provider.
//!
//! Unlike the LLM providers there is no prompt: texts go to `/v2/translate`
//! as an array and come back in the same order, so responses are zipped with
//! requests positionally.
//!
//! # Authentication
//!
//! The API key comes from the provider config, falling back to the
//! `DEEPL_API_KEY` environment variable. Free-tier keys end in `:fx` and are
//! routed to the api-free host automatically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{VerbiError, VerbiResult};
use crate::locale::{language_code, normalize_locale};
use crate::providers::{Provider, TranslationRequest, TranslationResponse};

const PRO_BASE_URL: &str = "https://api.deepl.com";
const FREE_BASE_URL: &str = "https://api-free.deepl.com";

/// Configuration for the DeepL provider, as it appears in `verbi.config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLConfig {
    /// Explicit API key. Falls back to `DEEPL_API_KEY` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// DeepL formality setting, e.g. `"more"` or `"less"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formality: Option<String>,
    /// Defaults to true so whitespace and ICU braces survive verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_formatting: Option<bool>,
}

#[derive(Clone)]
pub struct DeepLProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    formality: Option<String>,
    preserve_formatting: bool,
}

impl DeepLProvider {
    pub fn new(config: &DeepLConfig) -> VerbiResult<Self> {
        let api_key = match &config.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => std::env::var("DEEPL_API_KEY").map_err(|_| {
                VerbiError::config(
                    "DeepL API key missing: set provider.config.apiKey or DEEPL_API_KEY",
                )
            })?,
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        // Free-tier keys carry an `:fx` suffix and live on a separate host.
        let base_url = if api_key.ends_with(":fx") {
            FREE_BASE_URL
        } else {
            PRO_BASE_URL
        };

        Ok(Self {
            api_key,
            client,
            base_url: base_url.to_string(),
            formality: config.formality.clone(),
            preserve_formatting: config.preserve_formatting.unwrap_or(true),
        })
    }

    /// DeepL source languages are plain uppercase codes without regions.
    fn source_lang(locale: &str) -> String {
        language_code(locale).to_uppercase()
    }

    /// DeepL target languages are uppercase and want explicit regions for
    /// English and Portuguese.
    fn target_lang(locale: &str) -> String {
        let normalized = normalize_locale(locale);
        match normalized.as_str() {
            "en" => "EN-US".to_string(),
            "pt" => "PT-PT".to_string(),
            // DeepL has no regional Chinese targets.
            "zh" | "zh-CN" => "ZH".to_string(),
            other => other.to_uppercase(),
        }
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("formality", &self.formality)
            .finish()
    }
}

#[async_trait]
impl Provider for DeepLProvider {
    fn name(&self) -> &'static str {
        "deepl"
    }

    async fn translate(
        &self,
        requests: &[TranslationRequest],
    ) -> VerbiResult<Vec<TranslationResponse>> {
        let Some(first) = requests.first() else {
            return Ok(Vec::new());
        };

        let texts: Vec<&str> = requests
            .iter()
            .map(|request| request.source_text.as_str())
            .collect();
        let mut body = json!({
            "text": texts,
            "source_lang": Self::source_lang(&first.source_locale),
            "target_lang": Self::target_lang(&first.target_locale),
            "preserve_formatting": self.preserve_formatting,
            "tag_handling": "xml",
        });
        if let Some(formality) = &self.formality {
            body["formality"] = json!(formality);
        }

        let url = format!("{}/v2/translate", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
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
                VerbiError::provider_client("deepl", format!("HTTP {status}: {error_text}"))
            } else {
                VerbiError::provider_server("deepl", format!("HTTP {status}: {error_text}"))
            });
        }

        let reply: serde_json::Value = response.json().await?;
        let translations = reply["translations"].as_array().ok_or_else(|| {
            VerbiError::invalid_response("deepl", "missing 'translations' array")
        })?;
        if translations.len() != requests.len() {
            return Err(VerbiError::invalid_response(
                "deepl",
                format!(
                    "expected {} translations, got {}",
                    requests.len(),
                    translations.len()
                ),
            ));
        }

        requests
            .iter()
            .zip(translations)
            .map(|(request, translation)| {
                let text = translation["text"].as_str().ok_or_else(|| {
                    VerbiError::invalid_response("deepl", "translation item missing 'text'")
                })?;
                Ok(TranslationResponse {
                    key: request.key.clone(),
                    text: text.to_string(),
                    confidence: Some(0.98),
                    metadata: translation
                        .get("detected_source_language")
                        .and_then(|v| v.as_str())
                        .map(|lang| json!({ "detectedSourceLanguage": lang })),
                })
            })
            .collect()
    }

    async fn validate_config(&self) -> bool {
        let url = format!("{}/v2/usage", self.base_url);
        match self
            .client
            .get(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
