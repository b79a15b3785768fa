//! Error types for the verbi pipeline.
//!
//! Every stage reports through [`VerbiError`]; the [`VerbiResult`] alias is
//! used across the crate. Configuration errors are fatal and abort before
//! any pipeline work; parse errors are scoped to a single source file;
//! provider errors distinguish client-side problems (bad key, bad request,
//! malformed response) from upstream server failures.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type VerbiResult<T> = std::result::Result<T, VerbiError>;

#[derive(Error, Debug)]
pub enum VerbiError {
    /// Invalid or missing configuration. Always fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source file could not be parsed. Scoped to that file.
    #[error("Failed to parse {file}: {message}")]
    Parse { file: PathBuf, message: String },

    /// A provider rejected the request (authentication, quota, bad input).
    #[error("{provider} client error: {message}")]
    ProviderClient { provider: String, message: String },

    /// A provider's upstream service failed.
    #[error("{provider} server error: {message}")]
    ProviderServer { provider: String, message: String },

    /// A provider answered, but not in a shape we can use.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// The router had no rule and no fallback for a locale pair.
    #[error("No provider found for locale pair: {0}")]
    NoProviderForPair(String),

    /// A chunk failed after exhausting its retries. Carries the chunk's
    /// 1-based position so logs identify which slice of work died.
    #[error("Batch {index}/{total} failed: {source}")]
    Batch {
        index: usize,
        total: usize,
        #[source]
        source: Box<VerbiError>,
    },

    /// Translation cache could not be read or written.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A locale code failed BCP-47 validation.
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VerbiError {
    pub fn config(message: impl Into<String>) -> Self {
        VerbiError::Config(message.into())
    }

    pub fn parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        VerbiError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn provider_client(provider: impl Into<String>, message: impl Into<String>) -> Self {
        VerbiError::ProviderClient {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn provider_server(provider: impl Into<String>, message: impl Into<String>) -> Self {
        VerbiError::ProviderServer {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        VerbiError::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        VerbiError::Cache(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = VerbiError::config("locales must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: locales must not be empty"
        );
    }

    #[test]
    fn test_parse_error_includes_file() {
        let err = VerbiError::parse("src/app.tsx", "unexpected token");
        assert_eq!(err.to_string(), "Failed to parse src/app.tsx: unexpected token");
    }

    #[test]
    fn test_batch_error_carries_position() {
        let inner = VerbiError::provider_server("openai", "HTTP 503");
        let err = VerbiError::Batch {
            index: 2,
            total: 3,
            source: Box::new(inner),
        };
        assert_eq!(
            err.to_string(),
            "Batch 2/3 failed: openai server error: HTTP 503"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VerbiError = io.into();
        assert!(matches!(err, VerbiError::Io(_)));
    }

    #[test]
    fn test_no_provider_for_pair_message() {
        let err = VerbiError::NoProviderForPair("en>fr".to_string());
        assert_eq!(err.to_string(), "No provider found for locale pair: en>fr");
    }
}
