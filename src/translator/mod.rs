//! Translation driver: diffs catalogs, consults the cache and orchestrates
//! batched provider calls per target locale.
//!
//! # Example
//!
//! ```ignore
//! use verbi::cache::create_cache;
//! use verbi::config::VerbiConfig;
//! use verbi::providers::create_provider;
//! use verbi::translator::translate_all;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VerbiConfig::load(None)?;
//!     let provider = create_provider(&config.provider)?;
//!     let mut cache = create_cache(&config.cache);
//!
//!     for stats in translate_all(&config, provider, cache.as_mut()).await? {
//!         println!("{}: {} new, {} from cache", stats.locale, stats.translated, stats.cached);
//!     }
//!     Ok(())
//! }
//! ```

pub mod batcher;
pub mod differ;
pub mod retry;

pub use batcher::{BatchProcessor, BatchProgress, ChunkFuture, chunk_requests};
pub use differ::{DiffItem, DiffState, diff_catalogs, filter_for_translation};
pub use retry::{Backoff, RetryOptions, with_retry};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::TranslationCache;
use crate::config::VerbiConfig;
use crate::error::{VerbiError, VerbiResult};
use crate::extractor::catalog::{load_catalog, save_target_catalog};
use crate::providers::{Provider, TranslationRequest};

/// Messages per provider call.
pub const BATCH_SIZE: usize = 50;
/// Chunks in flight per wave.
pub const BATCH_CONCURRENCY: usize = 2;
pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Per-locale outcome of a translation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleStats {
    pub locale: String,
    /// Keys in the source catalog.
    pub total: usize,
    /// Keys translated by the provider in this run.
    pub translated: usize,
    /// Keys answered by the cache in this run.
    pub cached: usize,
    /// Keys that needed no work at all.
    pub already_translated: usize,
}

/// Translate one target locale end to end.
///
/// Loads both catalogs, diffs them, answers what it can from the cache and
/// sends the rest to the provider in retried, wave-concurrent batches. The
/// target catalog and the cache are committed after all batches finish;
/// a failed run leaves both untouched for this locale.
pub async fn translate_locale(
    config: &VerbiConfig,
    provider: Arc<dyn Provider>,
    cache: &mut dyn TranslationCache,
    target_locale: &str,
) -> VerbiResult<LocaleStats> {
    let source_catalog = load_catalog(&config.messages_dir, &config.source_locale)?;
    if source_catalog.is_empty() {
        return Err(VerbiError::config(
            "No messages found to translate. Run 'verbi scan' first.",
        ));
    }
    let total = source_catalog.len();

    let mut target_catalog = load_catalog(&config.messages_dir, target_locale)?;

    let diff = diff_catalogs(&source_catalog, &target_catalog);
    let deleted = diff.iter().filter(|i| i.state == DiffState::Deleted).count();
    if deleted > 0 {
        info!(
            locale = target_locale,
            deleted, "keys no longer in source; left in target catalog"
        );
    }

    let items = filter_for_translation(diff);
    if items.is_empty() {
        info!(locale = target_locale, "catalog already up to date");
        return Ok(LocaleStats {
            locale: target_locale.to_string(),
            total,
            translated: 0,
            cached: 0,
            already_translated: total,
        });
    }
    let already_translated = total - items.len();

    let mut pending: Vec<TranslationRequest> = Vec::new();
    let mut cached = 0usize;
    for item in items {
        let hit = cache
            .get(
                &item.key,
                &config.source_locale,
                target_locale,
                &item.source_text,
                &config.glossary,
            )
            .await?;
        match hit {
            Some(translation) => {
                target_catalog.insert(item.key, translation);
                cached += 1;
            }
            None => pending.push(TranslationRequest {
                key: item.key,
                source_text: item.source_text,
                source_locale: config.source_locale.clone(),
                target_locale: target_locale.to_string(),
                context: None,
                glossary: config.glossary.clone(),
            }),
        }
    }
    info!(
        locale = target_locale,
        to_translate = pending.len(),
        cached,
        "translation plan"
    );

    let mut translated = 0usize;
    if !pending.is_empty() {
        let by_key: HashMap<String, TranslationRequest> = pending
            .iter()
            .map(|request| (request.key.clone(), request.clone()))
            .collect();

        let progress_locale = target_locale.to_string();
        let mut batches = BatchProcessor::new(BATCH_SIZE, BATCH_CONCURRENCY).on_progress(
            move |progress| {
                info!(
                    locale = %progress_locale,
                    completed = progress.completed,
                    total = progress.total,
                    "translated {}%",
                    progress.percentage
                );
            },
        );

        let chunk_processor = {
            let provider = Arc::clone(&provider);
            move |chunk: Vec<TranslationRequest>| -> ChunkFuture {
                let provider = Arc::clone(&provider);
                Box::pin(async move {
                    let options = RetryOptions::default()
                        .max_attempts(RETRY_MAX_ATTEMPTS)
                        .delay(Duration::from_millis(RETRY_BASE_DELAY_MS))
                        .on_retry(|attempt, error| {
                            warn!(attempt, %error, "provider call failed, retrying");
                        });
                    with_retry(
                        || {
                            let provider = Arc::clone(&provider);
                            let chunk = chunk.clone();
                            async move { provider.translate(&chunk).await }
                        },
                        options,
                    )
                    .await
                })
            }
        };

        let responses = batches.process(pending, chunk_processor).await?;

        for response in responses {
            let Some(request) = by_key.get(&response.key) else {
                warn!(key = %response.key, "provider returned an unknown key, skipping");
                continue;
            };
            cache
                .set(
                    &request.key,
                    &request.source_locale,
                    &request.target_locale,
                    &request.source_text,
                    &request.glossary,
                    &response.text,
                )
                .await?;
            target_catalog.insert(response.key, response.text);
            translated += 1;
        }

        let unanswered = by_key.len().saturating_sub(translated);
        if unanswered > 0 {
            warn!(
                locale = target_locale,
                unanswered, "provider returned no translation for some keys"
            );
        }
    }

    let path = save_target_catalog(&config.messages_dir, target_locale, &target_catalog)?;
    debug!(path = %path.display(), "target catalog written");

    let stats = LocaleStats {
        locale: target_locale.to_string(),
        total,
        translated,
        cached,
        already_translated,
    };
    info!(
        locale = %stats.locale,
        total = stats.total,
        translated = stats.translated,
        cached = stats.cached,
        already_translated = stats.already_translated,
        "locale complete"
    );
    Ok(stats)
}

/// Translate every configured locale except the source, sequentially.
pub async fn translate_all(
    config: &VerbiConfig,
    provider: Arc<dyn Provider>,
    cache: &mut dyn TranslationCache,
) -> VerbiResult<Vec<LocaleStats>> {
    let mut stats = Vec::new();
    for locale in config.target_locales() {
        stats.push(translate_locale(config, Arc::clone(&provider), cache, &locale).await?);
    }
    Ok(stats)
}
