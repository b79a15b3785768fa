//! File-backed translation cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{fingerprint, now_ms, CacheEntry, TranslationCache, CACHE_VERSION};
use crate::config::GlossaryTerm;
use crate::error::VerbiResult;

/// On-disk layout of `translations.json`.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: String,
    entries: BTreeMap<String, CacheEntry>,
}

/// Translation cache persisted as `<path>/translations.json`.
///
/// Loading is lazy: the file is read on first access and kept in memory
/// afterwards. Every mutation rewrites the whole file, which is only sound
/// while a single process owns a given cache path; two concurrent writers
/// would overwrite each other's entries. Runs of the driver uphold this by
/// owning the cache exclusively for their lifetime.
///
/// A missing file, an unknown `version` or unparsable JSON all start an
/// empty cache rather than failing the run.
pub struct FileCache {
    cache_dir: PathBuf,
    cache_file: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    loaded: bool,
}

/// Aggregate numbers about a cache file, for the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub size_in_bytes: usize,
    /// Timestamp (ms) of the oldest entry, if any.
    pub oldest_entry: Option<u64>,
    /// Timestamp (ms) of the newest entry, if any.
    pub newest_entry: Option<u64>,
}

impl FileCache {
    pub fn new(path: &Path) -> Self {
        FileCache {
            cache_dir: path.to_path_buf(),
            cache_file: path.join("translations.json"),
            entries: BTreeMap::new(),
            loaded: false,
        }
    }

    fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        if !self.cache_file.is_file() {
            debug!(file = %self.cache_file.display(), "no cache file, starting empty");
            return;
        }

        let content = match fs::read_to_string(&self.cache_file) {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %self.cache_file.display(), error = %e, "could not read cache, starting empty");
                return;
            }
        };

        match serde_json::from_str::<CacheFile>(&content) {
            Ok(file) if file.version == CACHE_VERSION => {
                debug!(entries = file.entries.len(), "loaded translation cache");
                self.entries = file.entries;
            }
            Ok(file) => {
                warn!(
                    found = %file.version,
                    expected = CACHE_VERSION,
                    "cache file version mismatch, starting empty"
                );
            }
            Err(e) => {
                warn!(file = %self.cache_file.display(), error = %e, "corrupt cache file, starting empty");
            }
        }
    }

    fn save(&self) -> VerbiResult<()> {
        fs::create_dir_all(&self.cache_dir)?;
        let file = CacheFile {
            version: CACHE_VERSION.to_string(),
            entries: self.entries.clone(),
        };
        let mut content = serde_json::to_string_pretty(&file)?;
        content.push('\n');
        fs::write(&self.cache_file, content)?;
        Ok(())
    }

    /// Totals over the current cache contents.
    pub fn stats(&mut self) -> VerbiResult<CacheStats> {
        self.ensure_loaded();
        let size_in_bytes = serde_json::to_string(&self.entries)?.len();
        let timestamps: Vec<u64> = self.entries.values().map(|e| e.timestamp).collect();
        Ok(CacheStats {
            total_entries: self.entries.len(),
            size_in_bytes,
            oldest_entry: timestamps.iter().min().copied(),
            newest_entry: timestamps.iter().max().copied(),
        })
    }
}

#[async_trait]
impl TranslationCache for FileCache {
    async fn get(
        &mut self,
        key: &str,
        source_locale: &str,
        target_locale: &str,
        source_text: &str,
        glossary: &[GlossaryTerm],
    ) -> VerbiResult<Option<String>> {
        self.ensure_loaded();
        let fp = fingerprint(key, source_locale, target_locale, source_text, glossary)?;

        let Some(entry) = self.entries.get(&fp) else {
            return Ok(None);
        };

        // The fingerprint should guarantee these match; a hand-edited or
        // damaged file is the only way they can differ. Drop such entries.
        if entry.source_text != source_text || entry.target_locale != target_locale {
            warn!(key, "cache entry does not match its fingerprint, removing");
            self.entries.remove(&fp);
            self.save()?;
            return Ok(None);
        }

        Ok(Some(entry.translation.clone()))
    }

    async fn set(
        &mut self,
        key: &str,
        source_locale: &str,
        target_locale: &str,
        source_text: &str,
        glossary: &[GlossaryTerm],
        translation: &str,
    ) -> VerbiResult<()> {
        self.ensure_loaded();
        let fp = fingerprint(key, source_locale, target_locale, source_text, glossary)?;
        self.entries.insert(
            fp,
            CacheEntry {
                translation: translation.to_string(),
                timestamp: now_ms(),
                source_text: source_text.to_string(),
                target_locale: target_locale.to_string(),
            },
        );
        self.save()
    }

    async fn clear(&mut self) -> VerbiResult<()> {
        self.loaded = true;
        self.entries.clear();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_then_get_hits() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::new(dir.path());
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        let hit = cache.get("k1", "en", "fr", "Hello", &[]).await.unwrap();
        assert_eq!(hit.as_deref(), Some("Bonjour"));
    }

    #[tokio::test]
    async fn test_entries_survive_reload() {
        let dir = TempDir::new().unwrap();
        {
            let mut cache = FileCache::new(dir.path());
            cache
                .set("k1", "en", "fr", "Hello", &[], "Bonjour")
                .await
                .unwrap();
        }
        let mut cache = FileCache::new(dir.path());
        let hit = cache.get("k1", "en", "fr", "Hello", &[]).await.unwrap();
        assert_eq!(hit.as_deref(), Some("Bonjour"));
    }

    #[tokio::test]
    async fn test_changed_source_text_misses() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::new(dir.path());
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        let miss = cache.get("k1", "en", "fr", "Hello!", &[]).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_unknown_version_starts_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("translations.json"),
            r#"{ "version": "0.9", "entries": { "x": { "translation": "t", "timestamp": 1, "sourceText": "s", "targetLocale": "fr" } } }"#,
        )
        .unwrap();

        let mut cache = FileCache::new(dir.path());
        assert_eq!(cache.stats().unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("translations.json"), "{ not json").unwrap();

        let mut cache = FileCache::new(dir.path());
        let miss = cache.get("k1", "en", "fr", "Hello", &[]).await.unwrap();
        assert!(miss.is_none());
        // And the cache stays usable
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        assert_eq!(cache.stats().unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_tampered_entry_is_dropped() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::new(dir.path());
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();

        // Corrupt the stored source text behind the cache's back
        let path = dir.path().join("translations.json");
        let content = fs::read_to_string(&path)
            .unwrap()
            .replace("\"sourceText\": \"Hello\"", "\"sourceText\": \"Tampered\"");
        fs::write(&path, content).unwrap();

        let mut reloaded = FileCache::new(dir.path());
        let miss = reloaded.get("k1", "en", "fr", "Hello", &[]).await.unwrap();
        assert!(miss.is_none());
        // The bad entry was deleted and the deletion persisted
        assert_eq!(reloaded.stats().unwrap().total_entries, 0);
        let mut fresh = FileCache::new(dir.path());
        assert_eq!(fresh.stats().unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_clear_persists() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::new(dir.path());
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        cache.clear().await.unwrap();

        let mut reloaded = FileCache::new(dir.path());
        let miss = reloaded.get("k1", "en", "fr", "Hello", &[]).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_stats() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::new(dir.path());
        assert_eq!(
            cache.stats().unwrap(),
            CacheStats {
                total_entries: 0,
                size_in_bytes: 2, // "{}"
                oldest_entry: None,
                newest_entry: None,
            }
        );

        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        cache
            .set("k2", "en", "fr", "Bye", &[], "Au revoir")
            .await
            .unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.total_entries, 2);
        assert!(stats.size_in_bytes > 2);
        assert!(stats.oldest_entry.unwrap() <= stats.newest_entry.unwrap());
    }

    #[tokio::test]
    async fn test_same_text_different_locales_are_distinct() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::new(dir.path());
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        cache
            .set("k1", "en", "de", "Hello", &[], "Hallo")
            .await
            .unwrap();

        let fr = cache.get("k1", "en", "fr", "Hello", &[]).await.unwrap();
        let de = cache.get("k1", "en", "de", "Hello", &[]).await.unwrap();
        assert_eq!(fr.as_deref(), Some("Bonjour"));
        assert_eq!(de.as_deref(), Some("Hallo"));
    }
}
