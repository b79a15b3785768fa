//! Translation providers.
//!
//! A [`Provider`] takes a batch of [`TranslationRequest`]s for one locale
//! pair and returns one [`TranslationResponse`] per translated key.
//! Providers are selected by the tagged `provider` section of the config
//! and built through [`create_provider`]:
//!
//! ```json
//! { "name": "openai", "config": { "model": "gpt-4o-mini" } }
//! ```
//!
//! # Example
//! ```ignore
//! use verbi::providers::{create_provider, ProviderConfig};
//!
//! let config: ProviderConfig = serde_json::from_str(
//!     r#"{ "name": "deepl", "config": {} }"#,
//! )?;
//! let provider = create_provider(&config)?;
//! let responses = provider.translate(&requests).await?;
//! ```

pub mod anthropic;
pub mod deepl;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod router;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GlossaryTerm;
use crate::error::VerbiResult;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use deepl::{DeepLConfig, DeepLProvider};
pub use mock::{MockConfig, MockMode, MockProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use router::{RouterConfig, RouterProvider, RouterRuleConfig};

/// One message to translate. Batches handed to a provider always share a
/// single source/target locale pair and glossary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub key: String,
    pub source_text: String,
    pub source_locale: String,
    pub target_locale: String,
    /// Free-form hint shown to LLM providers ("button label", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glossary: Vec<GlossaryTerm>,
}

/// One translated message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
    pub key: String,
    pub text: String,
    /// Provider's own confidence estimate, 0..=1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Provider-specific extras (model name, detected source language, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// A machine-translation backend.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate a batch of requests sharing one locale pair. Providers may
    /// batch upstream calls however they like, but must return at most one
    /// response per request key.
    async fn translate(
        &self,
        requests: &[TranslationRequest],
    ) -> VerbiResult<Vec<TranslationResponse>>;

    /// Cheap credentials/connectivity probe. Returns `false` instead of
    /// erroring so callers can report the problem before doing any work.
    async fn validate_config(&self) -> bool;
}

/// Provider selection as it appears in the config file: a `name` tag and a
/// provider-specific `config` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", content = "config", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAi(OpenAiConfig),
    Anthropic(AnthropicConfig),
    Deepl(DeepLConfig),
    Router(RouterConfig),
    Mock(MockConfig),
}

/// Build the provider named by the config.
pub fn create_provider(config: &ProviderConfig) -> VerbiResult<Arc<dyn Provider>> {
    match config {
        ProviderConfig::OpenAi(config) => Ok(Arc::new(OpenAiProvider::new(config)?)),
        ProviderConfig::Anthropic(config) => Ok(Arc::new(AnthropicProvider::new(config)?)),
        ProviderConfig::Deepl(config) => Ok(Arc::new(DeepLProvider::new(config)?)),
        ProviderConfig::Router(config) => Ok(Arc::new(RouterProvider::new(config)?)),
        ProviderConfig::Mock(config) => Ok(Arc::new(MockProvider::from_config(config))),
    }
}
