//! Message extraction: scan a source tree, derive stable keys, build
//! catalogs.
//!
//! # Example
//! ```ignore
//! use verbi::config::VerbiConfig;
//! use verbi::extractor;
//!
//! let config = VerbiConfig::load(None)?;
//! let scan = extractor::scan_project(&config, std::path::Path::new("."))?;
//! extractor::catalog::write_catalogs(&scan.messages, &config)?;
//! ```

pub mod catalog;
pub mod key_generator;
pub mod parser;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::VerbiConfig;
use crate::error::VerbiResult;

pub use catalog::{Catalog, CatalogEntry, LocaleStatus};
pub use parser::MessageParser;

/// A translatable message found in the source tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMessage {
    /// Stable catalog key, or the literal key for `t('...')` calls.
    pub key: String,
    /// Source-locale message text, placeholders included.
    pub text: String,
    pub location: MessageLocation,
    /// True when the author wrote the key out (`t('checkout.title')`).
    pub explicit_key: bool,
}

/// Where a message was found. `line` is 1-based, `column` 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for MessageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Outcome of a project scan.
#[derive(Debug)]
pub struct ScanResult {
    /// Deduplicated messages in first-seen order.
    pub messages: Vec<ExtractedMessage>,
    pub files_scanned: usize,
    /// Files that could not be read or parsed. Their failures are logged
    /// and do not abort the scan.
    pub files_failed: usize,
}

/// Scan every source file matched by the configured include/exclude globs.
///
/// Messages are deduplicated by key. When the same key appears with
/// different text (an explicit-key collision or, very unlikely, a hash
/// prefix collision) the later occurrence wins and a warning names both
/// sites.
pub fn scan_project(config: &VerbiConfig, project_root: &Path) -> VerbiResult<ScanResult> {
    let files = discover_files(project_root, &config.include, &config.exclude)?;
    info!(files = files.len(), "scanning for messages");

    let mut parser = MessageParser::new()?;
    let mut raw_messages = Vec::new();
    let mut files_failed = 0usize;

    for (path, relative) in &files {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                warn!(file = %relative, error = %e, "skipping unreadable file");
                files_failed += 1;
                continue;
            }
        };
        match parser.parse_source(&source, relative) {
            Ok(messages) => {
                debug!(file = %relative, found = messages.len(), "scanned");
                raw_messages.extend(messages);
            }
            Err(e) => {
                warn!(file = %relative, error = %e, "skipping unparsable file");
                files_failed += 1;
            }
        }
    }

    let messages = dedupe_messages(raw_messages);
    Ok(ScanResult {
        messages,
        files_scanned: files.len(),
        files_failed,
    })
}

/// Collapse duplicate keys, keeping first-seen order and the last-seen
/// message for each key.
fn dedupe_messages(raw: Vec<ExtractedMessage>) -> Vec<ExtractedMessage> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, ExtractedMessage> = HashMap::new();

    for message in raw {
        match by_key.get(&message.key) {
            Some(existing) => {
                if existing.text != message.text {
                    warn!(
                        key = %message.key,
                        first = %existing.location,
                        second = %message.location,
                        "duplicate key with different text, later occurrence wins"
                    );
                }
            }
            None => order.push(message.key.clone()),
        }
        by_key.insert(message.key.clone(), message);
    }

    order
        .iter()
        .filter_map(|key| by_key.remove(key))
        .collect()
}

/// Walk the project and return `(absolute, project-relative)` paths of
/// every file matching the include globs and none of the exclude globs.
/// The list is sorted for deterministic scans.
fn discover_files(
    root: &Path,
    include: &[String],
    exclude: &[String],
) -> VerbiResult<Vec<(PathBuf, String)>> {
    let include = compile_patterns(include)?;
    let exclude = compile_patterns(exclude)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_str().unwrap_or("");
        !(name.starts_with('.') || name == "node_modules")
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };

        if include.iter().any(|p| p.matches(&relative))
            && !exclude.iter().any(|p| p.matches(&relative))
        {
            files.push((entry.into_path(), relative));
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn compile_patterns(patterns: &[String]) -> VerbiResult<Vec<Pattern>> {
    patterns
        .iter()
        .map(|raw| {
            Pattern::new(raw).map_err(|e| {
                crate::error::VerbiError::config(format!("Invalid glob pattern {raw:?}: {e}"))
            })
        })
        .collect()
}
