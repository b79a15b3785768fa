//! Locale code helpers.
//!
//! Locale codes flow in from configuration files and CLI flags in whatever
//! shape the user typed (`en_US`, `en-us`, `fr`). Everything downstream
//! (catalog paths, cache fingerprints, provider requests) works with the
//! normalized `language[-REGION]` form.

use icu_locale::Locale;

/// Normalize a locale code to canonical BCP-47 casing.
///
/// Underscores become hyphens, then the code is parsed and re-rendered by
/// `icu_locale` (`en_us` -> `en-US`, `FR` -> `fr`). A code that does not
/// parse at all is returned as-is after the separator fixup, so callers can
/// still surface it in error messages.
pub fn normalize_locale(locale: &str) -> String {
    let candidate = locale.trim().replace('_', "-");
    match candidate.parse::<Locale>() {
        Ok(parsed) => parsed.to_string(),
        Err(_) => candidate,
    }
}

/// Extract the bare language code: `en-US` -> `en`.
pub fn language_code(locale: &str) -> String {
    let normalized = normalize_locale(locale);
    normalized
        .split('-')
        .next()
        .unwrap_or(normalized.as_str())
        .to_string()
}

/// Compare two codes by bare language: `en-US` and `en_gb` are the same
/// language, `pt-BR` and `es` are not.
pub fn is_same_language(a: &str, b: &str) -> bool {
    language_code(a) == language_code(b)
}

/// Check that a code is a plain `language[-REGION]` locale.
///
/// Scripts and variants (`zh-Hans`, `de-DE-1901`) are rejected: catalogs
/// and providers here only distinguish language plus optional region.
/// Casing is forgiven; `normalize_locale` fixes it up.
pub fn is_valid_locale(locale: &str) -> bool {
    let candidate = locale.trim().replace('_', "-");
    match candidate.parse::<Locale>() {
        Ok(parsed) => {
            parsed.id.script.is_none() && parsed.id.variants.is_empty() && parsed.extensions.is_empty()
        }
        Err(_) => false,
    }
}
