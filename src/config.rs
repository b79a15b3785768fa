//! Project configuration.
//!
//! Configuration lives in `verbi.config.json` at the project root and is
//! deserialized straight into [`VerbiConfig`]. Field names on disk are
//! camelCase. Every section has working defaults so a minimal config only
//! needs `sourceLocale`, `locales` and `provider`:
//!
//! ```json
//! {
//!     "sourceLocale": "en",
//!     "locales": ["en", "fr", "de"],
//!     "provider": { "name": "openai", "config": { "model": "gpt-4o-mini" } }
//! }
//! ```
//!
//! The config object is constructed once and passed down explicitly; there
//! is no process-global configuration state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{VerbiError, VerbiResult};
use crate::locale;
use crate::providers::ProviderConfig;

/// Config file name looked up in the working directory when no explicit
/// path is given.
pub const CONFIG_FILE_NAME: &str = "verbi.config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbiConfig {
    /// Locale the source tree is written in.
    pub source_locale: String,
    /// All locales the project ships, source included.
    pub locales: Vec<String>,
    /// Root directory for catalogs (`<messagesDir>/<locale>/...`).
    #[serde(default = "default_messages_dir")]
    pub messages_dir: PathBuf,
    /// Glob patterns for source files to scan.
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// Glob patterns excluded from the scan.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Which translation provider to use, tagged by name.
    pub provider: ProviderConfig,
    /// Terms with fixed or forbidden translations, passed to providers and
    /// checked by the validator.
    #[serde(default)]
    pub glossary: Vec<GlossaryTerm>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub validate: ValidationConfig,
    #[serde(default)]
    pub namespace_strategy: NamespaceStrategy,
}

/// A glossary entry. `keep` pins the term verbatim in translations;
/// `translation` supplies per-locale renderings for the provider prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryTerm {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    #[serde(default)]
    pub kind: CacheKind,
    /// Directory holding `translations.json` for the file-backed cache.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            kind: CacheKind::default(),
            path: default_cache_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Check ICU placeholder parity between source and translation.
    #[serde(default = "default_true")]
    pub icu: bool,
    /// Check simple `{placeholder}` parity.
    #[serde(default = "default_true")]
    pub placeholders: bool,
    /// Treat missing translations as errors instead of counting them.
    #[serde(default)]
    pub fail_on_missing: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            icu: true,
            placeholders: true,
            fail_on_missing: false,
        }
    }
}

/// How extracted messages are grouped into catalog files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceStrategy {
    /// One namespace per source file (`src/ui/Button.tsx` -> `src.ui.Button`).
    File,
    /// One namespace per directory (`src/ui/Button.tsx` -> `src.ui`).
    #[default]
    Directory,
    /// Everything in a single `messages` namespace.
    Flat,
}

fn default_messages_dir() -> PathBuf {
    PathBuf::from("./messages")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".verbi-cache")
}

fn default_true() -> bool {
    true
}

fn default_include() -> Vec<String> {
    [
        "src/**/*.ts",
        "src/**/*.tsx",
        "src/**/*.js",
        "src/**/*.jsx",
        "app/**/*.ts",
        "app/**/*.tsx",
        "app/**/*.js",
        "app/**/*.jsx",
        "components/**/*.ts",
        "components/**/*.tsx",
        "components/**/*.js",
        "components/**/*.jsx",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_exclude() -> Vec<String> {
    ["**/*.test.*", "**/*.spec.*", "**/node_modules/**"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl VerbiConfig {
    /// Load and validate configuration.
    ///
    /// With `path = None` the default `verbi.config.json` in the working
    /// directory is used. A missing file, malformed JSON or failed
    /// validation all surface as [`VerbiError::Config`].
    pub fn load(path: Option<&Path>) -> VerbiResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        if !path.exists() {
            return Err(VerbiError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(&path)?;
        let config: VerbiConfig = serde_json::from_str(&content).map_err(|e| {
            VerbiError::config(format!("Invalid config in {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check the parts serde cannot: locale codes and non-empty lists.
    pub fn validate(&self) -> VerbiResult<()> {
        if !locale::is_valid_locale(&self.source_locale) {
            return Err(VerbiError::config(format!(
                "Invalid sourceLocale: {}",
                self.source_locale
            )));
        }
        if self.locales.is_empty() {
            return Err(VerbiError::config("locales must not be empty"));
        }
        for code in &self.locales {
            if !locale::is_valid_locale(code) {
                return Err(VerbiError::config(format!("Invalid locale: {}", code)));
            }
        }
        if !self.locales.contains(&self.source_locale) {
            return Err(VerbiError::config(format!(
                "locales must include the sourceLocale ({})",
                self.source_locale
            )));
        }
        if self.include.is_empty() {
            return Err(VerbiError::config("include patterns must not be empty"));
        }
        Ok(())
    }

    /// Locales to translate into: everything configured except the source.
    pub fn target_locales(&self) -> Vec<String> {
        self.locales
            .iter()
            .filter(|code| *code != &self.source_locale)
            .cloned()
            .collect()
    }
}
