//! Catalog files on disk.
//!
//! Source-locale catalogs are grouped by namespace, one JSON file per
//! namespace at `<messagesDir>/<sourceLocale>/<namespace>.json`:
//!
//! ```json
//! {
//!     "src.App.185f8db3": {
//!         "message": "Hello",
//!         "location": "src/App.tsx:12"
//!     }
//! }
//! ```
//!
//! Target-locale catalogs are written by the translation driver as a single
//! `<messagesDir>/<locale>/messages.json` whose entries carry only the
//! translated `message`. Loading accepts both shapes plus bare string
//! values, so hand-maintained catalogs keep working.
//!
//! Keys are written in sorted order: catalog files live in version control
//! and deterministic output keeps diffs reviewable.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{NamespaceStrategy, VerbiConfig};
use crate::error::VerbiResult;
use crate::extractor::{key_generator, ExtractedMessage};

/// Flattened catalog: key -> message text.
pub type Catalog = BTreeMap<String, String>;

/// One entry in a catalog file. `location` is only present in
/// source-locale catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Relative path of the key map below the messages directory.
pub const KEY_MAP_PATH: &str = ".verbi/keys.map.json";

/// Candidate file names tried before falling back to merging every JSON
/// file in a locale directory.
const CATALOG_CANDIDATES: [&str; 3] = ["messages.json", "root.json", "index.json"];

/// Resolve the catalog namespace for a source file under the configured
/// strategy.
pub fn namespace_for(strategy: NamespaceStrategy, file: &str) -> String {
    match strategy {
        NamespaceStrategy::File => key_generator::file_namespace(file),
        NamespaceStrategy::Directory => {
            let normalized = file.replace('\\', "/");
            let trimmed = normalized.trim_start_matches("./");
            match trimmed.rfind('/') {
                Some(idx) if idx > 0 => trimmed[..idx].replace('/', "."),
                _ => "root".to_string(),
            }
        }
        NamespaceStrategy::Flat => "messages".to_string(),
    }
}

/// Group extracted messages into namespace -> key -> entry maps.
pub fn group_by_namespace(
    messages: &[ExtractedMessage],
    strategy: NamespaceStrategy,
) -> BTreeMap<String, BTreeMap<String, CatalogEntry>> {
    let mut catalogs: BTreeMap<String, BTreeMap<String, CatalogEntry>> = BTreeMap::new();
    for message in messages {
        let namespace = namespace_for(strategy, &message.location.file);
        catalogs.entry(namespace).or_default().insert(
            message.key.clone(),
            CatalogEntry {
                message: message.text.clone(),
                location: Some(format!(
                    "{}:{}",
                    message.location.file, message.location.line
                )),
            },
        );
    }
    catalogs
}

/// Write the source-locale catalogs and the key map.
///
/// Returns the paths written, namespace files first, key map last.
pub fn write_catalogs(
    messages: &[ExtractedMessage],
    config: &VerbiConfig,
) -> VerbiResult<Vec<PathBuf>> {
    let catalogs = group_by_namespace(messages, config.namespace_strategy);
    let locale_dir = config.messages_dir.join(&config.source_locale);
    fs::create_dir_all(&locale_dir)?;

    let mut written = Vec::new();
    for (namespace, entries) in &catalogs {
        let path = locale_dir.join(format!("{namespace}.json"));
        write_json(&path, entries)?;
        debug!(namespace, entries = entries.len(), "wrote catalog");
        written.push(path);
    }

    written.push(write_key_map(messages, &config.messages_dir)?);
    Ok(written)
}

/// Write `<messagesDir>/.verbi/keys.map.json`: every extracted message with
/// its exact location, for editor tooling and key lookups.
pub fn write_key_map(
    messages: &[ExtractedMessage],
    messages_dir: &Path,
) -> VerbiResult<PathBuf> {
    let path = messages_dir.join(KEY_MAP_PATH);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_json(&path, &messages)?;
    Ok(path)
}

/// Load a locale's catalog, flattened to key -> text.
///
/// Tries `messages.json`, `root.json` and `index.json` in that order, then
/// falls back to merging every `*.json` under the locale directory (which
/// is how namespaced source catalogs load). A missing directory is an empty
/// catalog, not an error.
pub fn load_catalog(messages_dir: &Path, locale: &str) -> VerbiResult<Catalog> {
    let locale_dir = messages_dir.join(locale);
    if !locale_dir.is_dir() {
        debug!(locale, dir = %locale_dir.display(), "no catalog directory");
        return Ok(Catalog::new());
    }

    for candidate in CATALOG_CANDIDATES {
        let path = locale_dir.join(candidate);
        if path.is_file() {
            let mut catalog = Catalog::new();
            merge_catalog_file(&path, &mut catalog)?;
            return Ok(catalog);
        }
    }

    let mut catalog = Catalog::new();
    let mut paths: Vec<PathBuf> = WalkDir::new(&locale_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("json")
        })
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    for path in paths {
        merge_catalog_file(&path, &mut catalog)?;
    }
    Ok(catalog)
}

fn merge_catalog_file(path: &Path, catalog: &mut Catalog) -> VerbiResult<()> {
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;

    let Some(object) = value.as_object() else {
        warn!(file = %path.display(), "catalog root is not an object, skipping");
        return Ok(());
    };

    for (key, value) in object {
        if let Some(text) = value.as_str() {
            catalog.insert(key.clone(), text.to_string());
        } else if let Some(text) = value.get("message").and_then(|m| m.as_str()) {
            catalog.insert(key.clone(), text.to_string());
        } else {
            debug!(key, file = %path.display(), "skipping non-message entry");
        }
    }
    Ok(())
}

/// Write a target-locale catalog to `<messagesDir>/<locale>/messages.json`.
pub fn save_target_catalog(
    messages_dir: &Path,
    locale: &str,
    catalog: &Catalog,
) -> VerbiResult<PathBuf> {
    let entries: BTreeMap<&String, CatalogEntry> = catalog
        .iter()
        .map(|(key, text)| {
            (
                key,
                CatalogEntry {
                    message: text.clone(),
                    location: None,
                },
            )
        })
        .collect();

    let path = messages_dir.join(locale).join("messages.json");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_json(&path, &entries)?;
    Ok(path)
}

/// Per-locale translation coverage against the source catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleStatus {
    pub locale: String,
    pub total: usize,
    pub translated: usize,
    pub missing: usize,
}

/// Compare every target locale's catalog against the source catalog.
pub fn translation_status(config: &VerbiConfig) -> VerbiResult<Vec<LocaleStatus>> {
    let source = load_catalog(&config.messages_dir, &config.source_locale)?;
    let mut statuses = Vec::new();

    for locale in config.target_locales() {
        let target = load_catalog(&config.messages_dir, &locale)?;
        let translated = source.keys().filter(|key| target.contains_key(*key)).count();
        statuses.push(LocaleStatus {
            locale,
            total: source.len(),
            translated,
            missing: source.len() - translated,
        });
    }
    Ok(statuses)
}

/// Pretty JSON with a trailing newline, matching what formatters and
/// version control expect of committed files.
fn write_json<T: Serialize>(path: &Path, value: &T) -> VerbiResult<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}
