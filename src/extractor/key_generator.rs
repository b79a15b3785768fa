//! Key derivation for extracted messages.
//!
//! Keys are content-addressed: the same message text in the same namespace
//! always yields the same key, on every machine and every run. That
//! stability is what makes catalog diffing and the translation cache sound,
//! so the hash input is the exact message text, nothing normalized.

use sha2::{Digest, Sha256};

/// Hex characters of the SHA-256 digest kept in a stable key.
const HASH_PREFIX_LEN: usize = 8;

/// Namespace used when neither an explicit namespace nor a file path is
/// available.
pub const DEFAULT_NAMESPACE: &str = "global";

/// Word cap for readable keys.
const READABLE_KEY_MAX_WORDS: usize = 4;

/// Default character cap for the readable part of a key.
pub const READABLE_KEY_MAX_LEN: usize = 30;

/// Derive the stable key for a message: `{namespace}.{hash8}` where
/// `hash8` is the first 8 lowercase hex characters of the SHA-256 of the
/// message text.
///
/// # Example
/// ```ignore
/// let key = stable_key("Hello", "global");
/// assert_eq!(key, "global.185f8db3");
/// ```
pub fn stable_key(text: &str, namespace: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hash = String::with_capacity(HASH_PREFIX_LEN);
    for byte in digest.iter().take(HASH_PREFIX_LEN / 2) {
        hash.push_str(&format!("{byte:02x}"));
    }
    format!("{namespace}.{hash}")
}

/// Resolve the namespace for a message: an explicit override wins, then
/// the source file path, then [`DEFAULT_NAMESPACE`].
pub fn resolve_namespace(explicit: Option<&str>, file: Option<&str>) -> String {
    if let Some(namespace) = explicit {
        if !namespace.is_empty() {
            return namespace.to_string();
        }
    }
    if let Some(file) = file {
        let namespace = file_namespace(file);
        if !namespace.is_empty() {
            return namespace;
        }
    }
    DEFAULT_NAMESPACE.to_string()
}

/// Turn a project-relative file path into a namespace:
/// `src/components/Button.tsx` -> `src.components.Button`.
pub fn file_namespace(file: &str) -> String {
    let normalized = file.replace('\\', "/");
    let mut trimmed = normalized.trim_start_matches("./");
    for ext in [".tsx", ".ts", ".jsx", ".js"] {
        if let Some(stripped) = trimmed.strip_suffix(ext) {
            trimmed = stripped;
            break;
        }
    }
    trimmed.replace('/', ".")
}

/// Derive a human-readable key from the first words of the message:
/// `"Save your changes"` -> `{namespace}.saveYourChanges`.
///
/// Lowercases the text, strips everything but ASCII alphanumerics and
/// whitespace, camelCases the first four words and truncates the result to
/// `max_length` characters. Falls back to [`stable_key`] when nothing
/// word-like survives (symbols-only or non-Latin text).
pub fn readable_key(text: &str, namespace: &str, max_length: usize) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .take(READABLE_KEY_MAX_WORDS)
        .collect();

    if words.is_empty() {
        return stable_key(text, namespace);
    }

    let mut slug = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            slug.push_str(word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                slug.push(first.to_ascii_uppercase());
                slug.push_str(chars.as_str());
            }
        }
    }
    slug.truncate(max_length);

    format!("{namespace}.{slug}")
}

/// A key is valid when it starts with a letter and contains only letters,
/// digits, dots, underscores and hyphens.
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Force a key into valid shape: invalid characters become `_`, and a key
/// that does not start with a letter gets a `key_` prefix.
pub fn sanitize_key(key: &str) -> String {
    let mut sanitized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !sanitized.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        sanitized = format!("key_{sanitized}");
    }
    sanitized
}
