//! Localization pipeline for TypeScript/React projects
//!
//! Scans TSX/TS sources for translatable messages, maintains per-locale JSON
//! catalogs and drives LLM or MT providers to fill the gaps, with a
//! content-addressed cache so unchanged text is never paid for twice.
//!
//! # Workflow Example
//!
//! ```ignore
//! use verbi::cache::create_cache;
//! use verbi::config::VerbiConfig;
//! use verbi::extractor::{self, catalog};
//! use verbi::providers::create_provider;
//! use verbi::translator::translate_all;
//! use verbi::validator::validate_all;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VerbiConfig::load(None)?;
//!
//!     // 1. Extract messages into the source catalog
//!     let scan = extractor::scan_project(&config, std::path::Path::new("."))?;
//!     catalog::write_catalogs(&scan.messages, &config)?;
//!
//!     // 2. Translate every target locale
//!     let provider = create_provider(&config.provider)?;
//!     let mut cache = create_cache(&config.cache);
//!     translate_all(&config, provider, cache.as_mut()).await?;
//!
//!     // 3. Check placeholder parity
//!     for report in validate_all(&config)? {
//!         println!("{}: {} valid, {} invalid", report.locale, report.stats.valid, report.stats.invalid);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod locale;
pub mod providers;
pub mod translator;
pub mod validator;

// Re-export main types for convenient access
pub use cache::{TranslationCache, create_cache};
pub use config::VerbiConfig;
pub use error::{VerbiError, VerbiResult};
pub use extractor::{Catalog, ExtractedMessage, ScanResult, scan_project};
pub use providers::{
    Provider, ProviderConfig, TranslationRequest, TranslationResponse, create_provider,
};
pub use translator::{LocaleStats, translate_all, translate_locale};
pub use validator::{ValidationReport, validate_all};
