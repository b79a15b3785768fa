//! Locale-pair router composed over other providers.
//!
//! The router is itself a [`Provider`]: it groups incoming requests by
//! locale pair, resolves each pair against an ordered rule list, dispatches
//! every group to its backing provider in parallel and flattens the results.
//!
//! Rules look like this in `verbi.config.json`:
//!
//! ```json
//! {
//!   "name": "router",
//!   "config": {
//!     "rules": [
//!       { "match": ["en>de", "en>fr"], "use": { "name": "deepl", "config": {} } }
//!     ],
//!     "fallback": { "name": "openai", "config": {} }
//!   }
//! }
//! ```
//!
//! A pattern is `source>target` where either side may be `*`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};

use crate::error::{VerbiError, VerbiResult};
use crate::locale::normalize_locale;
use crate::providers::{
    Provider, ProviderConfig, TranslationRequest, TranslationResponse, create_provider,
};

/// One routing rule: a list of locale-pair patterns and the provider they
/// route to. Boxed because provider configs nest recursively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterRuleConfig {
    #[serde(rename = "match")]
    pub patterns: Vec<String>,
    #[serde(rename = "use")]
    pub provider: Box<ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    pub rules: Vec<RouterRuleConfig>,
    /// Used when no rule matches. Without it, unmatched pairs are an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Box<ProviderConfig>>,
}

struct Rule {
    patterns: Vec<(String, String)>,
    provider: Arc<dyn Provider>,
}

pub struct RouterProvider {
    rules: Vec<Rule>,
    fallback: Option<Arc<dyn Provider>>,
}

impl RouterProvider {
    pub fn new(config: &RouterConfig) -> VerbiResult<Self> {
        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            let patterns = rule
                .patterns
                .iter()
                .map(|pattern| parse_pattern(pattern))
                .collect::<VerbiResult<Vec<_>>>()?;
            rules.push(Rule {
                patterns,
                provider: create_provider(&rule.provider)?,
            });
        }

        let fallback = match &config.fallback {
            Some(fallback) => Some(create_provider(fallback)?),
            None => None,
        };

        Ok(Self { rules, fallback })
    }

    /// First matching rule wins; otherwise the fallback.
    fn resolve(&self, source_locale: &str, target_locale: &str) -> Option<Arc<dyn Provider>> {
        for rule in &self.rules {
            let matched = rule.patterns.iter().any(|(source, target)| {
                side_matches(source, source_locale) && side_matches(target, target_locale)
            });
            if matched {
                return Some(Arc::clone(&rule.provider));
            }
        }
        self.fallback.as_ref().map(Arc::clone)
    }

    /// Every provider referenced by a rule or the fallback, deduplicated.
    fn backing_providers(&self) -> Vec<Arc<dyn Provider>> {
        let mut providers: Vec<Arc<dyn Provider>> = Vec::new();
        let all = self
            .rules
            .iter()
            .map(|rule| &rule.provider)
            .chain(self.fallback.as_ref());
        for provider in all {
            if !providers.iter().any(|seen| Arc::ptr_eq(seen, provider)) {
                providers.push(Arc::clone(provider));
            }
        }
        providers
    }
}

fn parse_pattern(pattern: &str) -> VerbiResult<(String, String)> {
    match pattern.split_once('>') {
        Some((source, target)) if !source.trim().is_empty() && !target.trim().is_empty() => {
            Ok((source.trim().to_string(), target.trim().to_string()))
        }
        _ => Err(VerbiError::config(format!(
            "Invalid router pattern '{pattern}': expected 'source>target'"
        ))),
    }
}

fn side_matches(pattern: &str, locale: &str) -> bool {
    pattern == "*" || normalize_locale(pattern) == normalize_locale(locale)
}

impl std::fmt::Debug for RouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterProvider")
            .field("rules", &self.rules.len())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

#[async_trait]
impl Provider for RouterProvider {
    fn name(&self) -> &'static str {
        "router"
    }

    async fn translate(
        &self,
        requests: &[TranslationRequest],
    ) -> VerbiResult<Vec<TranslationResponse>> {
        // Group by locale pair, keeping first-seen group order.
        let mut groups: Vec<((String, String), Vec<TranslationRequest>)> = Vec::new();
        for request in requests {
            let pair = (request.source_locale.clone(), request.target_locale.clone());
            match groups.iter_mut().find(|(key, _)| *key == pair) {
                Some((_, group)) => group.push(request.clone()),
                None => groups.push((pair, vec![request.clone()])),
            }
        }

        let mut dispatches = Vec::with_capacity(groups.len());
        for ((source, target), group) in groups {
            let provider = self.resolve(&source, &target).ok_or_else(|| {
                VerbiError::NoProviderForPair(format!("{source}>{target}"))
            })?;
            dispatches.push(async move { provider.translate(&group).await });
        }

        let results = try_join_all(dispatches).await?;
        Ok(results.into_iter().flatten().collect())
    }

    async fn validate_config(&self) -> bool {
        let providers = self.backing_providers();
        if providers.is_empty() {
            return false;
        }
        let checks = providers
            .iter()
            .map(|provider| provider.validate_config());
        join_all(checks).await.into_iter().all(|ok| ok)
    }
}
