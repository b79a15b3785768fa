//! Translation validation: ICU parity, placeholder parity, glossary and
//! length checks over a locale's catalog.
//!
//! # Example
//!
//! ```ignore
//! use verbi::validator::validate_all;
//!
//! let reports = validate_all(&config)?;
//! for report in &reports {
//!     println!("{}: {} invalid, {} missing", report.locale, report.stats.invalid, report.stats.missing);
//! }
//! ```

pub mod icu;

pub use icu::{IcuValidation, parse_icu, validate_icu, validate_icu_parity};

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::config::VerbiConfig;
use crate::error::VerbiResult;
use crate::extractor::Catalog;
use crate::extractor::catalog::load_catalog;

/// One problem found for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub locale: String,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

const LENGTH_RATIO_MAX: f64 = 3.0;
const LENGTH_RATIO_MIN: f64 = 1.0 / 3.0;

/// Sweep every source key against one target catalog.
pub fn validate_translations(
    source: &Catalog,
    target: &Catalog,
    locale: &str,
    config: &VerbiConfig,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut stats = ValidationStats {
        total: source.len(),
        ..ValidationStats::default()
    };

    for (key, source_text) in source {
        let target_text = match target.get(key) {
            Some(text) if !text.is_empty() => text,
            _ => {
                stats.missing += 1;
                if config.validate.fail_on_missing {
                    errors.push(ValidationIssue {
                        key: key.clone(),
                        message: "Missing translation".to_string(),
                    });
                }
                continue;
            }
        };

        let parity_errors = if config.validate.icu {
            validate_icu_parity(source_text, target_text)
        } else if config.validate.placeholders {
            simple_placeholder_parity(source_text, target_text)
        } else {
            Vec::new()
        };
        if !parity_errors.is_empty() {
            stats.invalid += 1;
            for message in parity_errors {
                errors.push(ValidationIssue {
                    key: key.clone(),
                    message,
                });
            }
            continue;
        }

        // Glossary violations are recorded but do not invalidate the entry.
        for term in &config.glossary {
            if term.keep == Some(true)
                && source_text.contains(&term.term)
                && !target_text.contains(&term.term)
            {
                errors.push(ValidationIssue {
                    key: key.clone(),
                    message: format!("Glossary term \"{}\" missing from translation", term.term),
                });
            }
        }

        let source_len = source_text.chars().count();
        let target_len = target_text.chars().count();
        if source_len > 0 {
            let ratio = target_len as f64 / source_len as f64;
            if !(LENGTH_RATIO_MIN..=LENGTH_RATIO_MAX).contains(&ratio) {
                warnings.push(ValidationIssue {
                    key: key.clone(),
                    message: format!(
                        "Translation length significantly different ({}% of original)",
                        (ratio * 100.0).round() as u64
                    ),
                });
            }
        }

        stats.valid += 1;
    }

    ValidationReport {
        locale: locale.to_string(),
        errors,
        warnings,
        stats,
    }
}

/// Validate every target locale against the source catalog on disk.
pub fn validate_all(config: &VerbiConfig) -> VerbiResult<Vec<ValidationReport>> {
    let source = load_catalog(&config.messages_dir, &config.source_locale)?;
    let mut reports = Vec::new();
    for locale in config.target_locales() {
        let target = load_catalog(&config.messages_dir, &locale)?;
        reports.push(validate_translations(&source, &target, &locale, config));
    }
    Ok(reports)
}

/// Brace-placeholder parity without the ICU grammar, for when ICU checking
/// is turned off.
fn simple_placeholder_parity(source: &str, translation: &str) -> Vec<String> {
    let source_names = brace_placeholders(source);
    let translation_names = brace_placeholders(translation);

    let mut errors = Vec::new();
    let missing: Vec<_> = source_names
        .iter()
        .filter(|name| !translation_names.contains(name))
        .cloned()
        .collect();
    let extra: Vec<_> = translation_names
        .iter()
        .filter(|name| !source_names.contains(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        errors.push(format!("Missing: {}", missing.join(", ")));
    }
    if !extra.is_empty() {
        errors.push(format!("Extra: {}", extra.join(", ")));
    }
    errors
}

fn brace_placeholders(text: &str) -> Vec<String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\{([^}]+)\}").unwrap());

    let mut names = Vec::new();
    for captures in re.captures_iter(text) {
        let name = captures[1].trim().to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CacheConfig, GlossaryTerm, NamespaceStrategy, ValidationConfig, VerbiConfig,
    };
    use crate::providers::{MockConfig, ProviderConfig};
    use std::path::Path;

    fn test_config(messages_dir: &Path) -> VerbiConfig {
        VerbiConfig {
            source_locale: "en".to_string(),
            locales: vec!["en".to_string(), "fr".to_string()],
            messages_dir: messages_dir.to_path_buf(),
            include: vec!["src/**/*.tsx".to_string()],
            exclude: Vec::new(),
            provider: ProviderConfig::Mock(MockConfig::default()),
            glossary: Vec::new(),
            cache: CacheConfig::default(),
            validate: ValidationConfig::default(),
            namespace_strategy: NamespaceStrategy::default(),
        }
    }

    fn catalog(pairs: &[(&str, &str)]) -> Catalog {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ========== Sweep Tests ==========

    #[test]
    fn test_clean_catalog_validates() {
        let config = test_config(Path::new("messages"));
        let source = catalog(&[("a", "Hello {name}"), ("b", "Bye")]);
        let target = catalog(&[("a", "Bonjour {name}"), ("b", "Au revoir")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert!(report.is_clean());
        assert_eq!(report.stats.total, 2);
        assert_eq!(report.stats.valid, 2);
        assert_eq!(report.stats.invalid, 0);
        assert_eq!(report.stats.missing, 0);
    }

    #[test]
    fn test_missing_translation_counts_without_error() {
        let config = test_config(Path::new("messages"));
        let source = catalog(&[("a", "Hello"), ("b", "Bye")]);
        let target = catalog(&[("a", "Bonjour"), ("b", "")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert_eq!(report.stats.missing, 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_fail_on_missing_escalates() {
        let mut config = test_config(Path::new("messages"));
        config.validate.fail_on_missing = true;
        let source = catalog(&[("a", "Hello")]);

        let report = validate_translations(&source, &Catalog::new(), "fr", &config);
        assert_eq!(report.stats.missing, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].message, "Missing translation");
        assert_eq!(report.errors[0].key, "a");
    }

    #[test]
    fn test_icu_parity_failure_marks_invalid() {
        let config = test_config(Path::new("messages"));
        let source = catalog(&[("a", "Hello {name}")]);
        let target = catalog(&[("a", "Bonjour")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert_eq!(report.stats.invalid, 1);
        assert_eq!(report.stats.valid, 0);
        assert_eq!(report.errors[0].message, "Missing: name");
    }

    #[test]
    fn test_extra_placeholder_marks_invalid() {
        let config = test_config(Path::new("messages"));
        let source = catalog(&[("a", "Hello")]);
        let target = catalog(&[("a", "Bonjour {foo}")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert_eq!(report.errors[0].message, "Extra: foo");
    }

    #[test]
    fn test_invalid_icu_in_translation_is_reported() {
        let config = test_config(Path::new("messages"));
        let source = catalog(&[("a", "Hello {name}")]);
        let target = catalog(&[("a", "Bonjour {name")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert_eq!(report.stats.invalid, 1);
        assert!(
            report.errors[0]
                .message
                .starts_with("Translation has invalid ICU syntax:")
        );
    }

    #[test]
    fn test_simple_parity_when_icu_disabled() {
        let mut config = test_config(Path::new("messages"));
        config.validate.icu = false;
        let source = catalog(&[("a", "Hello {name}")]);
        let target = catalog(&[("a", "Bonjour {nom}")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert_eq!(report.stats.invalid, 1);
        assert_eq!(report.errors[0].message, "Missing: name");
        assert_eq!(report.errors[1].message, "Extra: nom");
    }

    #[test]
    fn test_all_checks_disabled_accepts_mismatch() {
        let mut config = test_config(Path::new("messages"));
        config.validate.icu = false;
        config.validate.placeholders = false;
        let source = catalog(&[("a", "Hello {name}")]);
        let target = catalog(&[("a", "Bonjour")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert!(report.is_clean());
        assert_eq!(report.stats.valid, 1);
    }

    #[test]
    fn test_glossary_keep_term_is_non_blocking() {
        let mut config = test_config(Path::new("messages"));
        config.glossary = vec![GlossaryTerm {
            term: "Verbi".to_string(),
            keep: Some(true),
            translation: None,
        }];
        let source = catalog(&[("a", "Welcome to Verbi")]);
        let target = catalog(&[("a", "Bienvenue")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("Verbi"));
        // Still counted valid: the text itself is fine.
        assert_eq!(report.stats.valid, 1);
        assert_eq!(report.stats.invalid, 0);
    }

    #[test]
    fn test_length_ratio_warns() {
        let config = test_config(Path::new("messages"));
        let source = catalog(&[("a", "This is a fairly long explanatory sentence")]);
        let target = catalog(&[("a", "Oui")]);

        let report = validate_translations(&source, &target, "fr", &config);
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("% of original"));
        assert_eq!(report.stats.valid, 1);
    }

    // ========== Helper Tests ==========

    #[test]
    fn test_brace_placeholders_dedupe() {
        assert_eq!(
            brace_placeholders("{a} and {b} and {a}"),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_validate_all_reads_catalogs_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let en = dir.path().join("en");
        let fr = dir.path().join("fr");
        std::fs::create_dir_all(&en).unwrap();
        std::fs::create_dir_all(&fr).unwrap();
        std::fs::write(
            en.join("messages.json"),
            r#"{"a": "Hello {name}", "b": "Bye"}"#,
        )
        .unwrap();
        std::fs::write(fr.join("messages.json"), r#"{"a": "Bonjour {name}"}"#).unwrap();

        let config = test_config(dir.path());
        let reports = validate_all(&config).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].locale, "fr");
        assert_eq!(reports[0].stats.valid, 1);
        assert_eq!(reports[0].stats.missing, 1);
    }
}
