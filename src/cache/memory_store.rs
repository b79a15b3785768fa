//! In-memory translation cache, for tests and one-shot runs where nothing
//! should touch the filesystem.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::cache::{fingerprint, TranslationCache};
use crate::config::GlossaryTerm;
use crate::error::VerbiResult;

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TranslationCache for MemoryCache {
    async fn get(
        &mut self,
        key: &str,
        source_locale: &str,
        target_locale: &str,
        source_text: &str,
        glossary: &[GlossaryTerm],
    ) -> VerbiResult<Option<String>> {
        let fp = fingerprint(key, source_locale, target_locale, source_text, glossary)?;
        Ok(self.entries.get(&fp).cloned())
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
        let fp = fingerprint(key, source_locale, target_locale, source_text, glossary)?;
        self.entries.insert(fp, translation.to_string());
        Ok(())
    }

    async fn clear(&mut self) -> VerbiResult<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let mut cache = MemoryCache::new();
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        let hit = cache.get("k1", "en", "fr", "Hello", &[]).await.unwrap();
        assert_eq!(hit.as_deref(), Some("Bonjour"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_changed_inputs_miss() {
        let mut cache = MemoryCache::new();
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        assert!(cache.get("k1", "en", "fr", "Hello!", &[]).await.unwrap().is_none());
        assert!(cache.get("k1", "en", "de", "Hello", &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let mut cache = MemoryCache::new();
        cache
            .set("k1", "en", "fr", "Hello", &[], "Bonjour")
            .await
            .unwrap();
        cache.clear().await.unwrap();
        assert!(cache.is_empty());
        assert!(cache.get("k1", "en", "fr", "Hello", &[]).await.unwrap().is_none());
    }
}
