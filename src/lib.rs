//! Review-Harvest: structured review extraction from paginated listings
//!
//! This crate implements a scraping pipeline that walks a paginated listing
//! site, extracts review records through selector-fallback strategies,
//! normalizes them into typed records, deduplicates across pages, and
//! exports the result as CSV.

pub mod browser;
pub mod config;
pub mod output;
pub mod records;
pub mod scraper;

use thiserror::Error;

/// Main error type for Review-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser driver error: {0}")]
    Driver(#[from] browser::DriverError),

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Rate limited by target site")]
    RateLimited { retry_after_seconds: Option<u64> },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid target URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Review-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use browser::{DriverError, ElementId, PageDriver, StaticDriver};
pub use config::Config;
pub use records::{CanonicalRecord, IdentityKey, PaginationState, RawRecord, ScrapeOutcome};
pub use scraper::{scrape, scrape_with_driver};
