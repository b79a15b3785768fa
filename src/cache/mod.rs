//! Content-addressed translation cache.
//!
//! Every cached translation is stored under a SHA-256 fingerprint of the
//! full request identity: key, source text, source locale, target locale
//! and the glossary. Change any of them (including reordering glossary
//! terms) and the lookup misses, so stale translations can never be served
//! for changed inputs.
//!
//! The cache is an explicit object constructed once per run and passed to
//! the translation driver; there is no process-global cache state.
//!
//! # Example
//! ```ignore
//! use verbi::cache::{create_cache, TranslationCache};
//!
//! let mut cache = create_cache(&config.cache);
//! cache.set("app.k1", "en", "fr", "Hello", &[], "Bonjour").await?;
//! let hit = cache.get("app.k1", "en", "fr", "Hello", &[]).await?;
//! assert_eq!(hit.as_deref(), Some("Bonjour"));
//! ```

pub mod file_store;
pub mod memory_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{CacheConfig, CacheKind, GlossaryTerm};
use crate::error::VerbiResult;

pub use file_store::{CacheStats, FileCache};
pub use memory_store::MemoryCache;

/// Cache file format version. Files written by other versions are ignored
/// and rebuilt from scratch.
pub const CACHE_VERSION: &str = "1.0";

/// A persisted cache entry. `source_text` and `target_locale` are stored
/// redundantly so entries can be verified against the request that hits
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub translation: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub source_text: String,
    pub target_locale: String,
}

/// Storage backend for translated messages.
#[async_trait]
pub trait TranslationCache: Send + Sync {
    /// Look up a translation. Returns `None` on a miss.
    async fn get(
        &mut self,
        key: &str,
        source_locale: &str,
        target_locale: &str,
        source_text: &str,
        glossary: &[GlossaryTerm],
    ) -> VerbiResult<Option<String>>;

    /// Store a translation under the request's fingerprint.
    async fn set(
        &mut self,
        key: &str,
        source_locale: &str,
        target_locale: &str,
        source_text: &str,
        glossary: &[GlossaryTerm],
        translation: &str,
    ) -> VerbiResult<()>;

    /// Drop every entry.
    async fn clear(&mut self) -> VerbiResult<()>;
}

/// Build the cache configured for this project.
pub fn create_cache(config: &CacheConfig) -> Box<dyn TranslationCache> {
    match config.kind {
        CacheKind::File => Box::new(FileCache::new(&config.path)),
        CacheKind::Memory => Box::new(MemoryCache::new()),
    }
}

/// Compute the fingerprint for a cache lookup. Hash input order is fixed;
/// changing it would orphan every existing cache file.
pub(crate) fn fingerprint(
    key: &str,
    source_locale: &str,
    target_locale: &str,
    source_text: &str,
    glossary: &[GlossaryTerm],
) -> VerbiResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(source_text.as_bytes());
    hasher.update(source_locale.as_bytes());
    hasher.update(target_locale.as_bytes());
    hasher.update(serde_json::to_string(glossary)?.as_bytes());

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    Ok(hex)
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
