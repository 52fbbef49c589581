use crate::config::types::{Config, OutputConfig, ScraperConfig, TargetConfig};
use crate::ConfigError;
use std::path::Path;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_scraper_config(&config.scraper)?;
    validate_output_config(&config.output)?;
    validate_selector_overrides(&config.selectors.containers)?;
    Ok(())
}

/// Validates the target configuration
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", config.url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use http or https scheme",
            config.url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' has no host",
            config.url
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates scraper pacing and retry configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.base_retry_delay < 1 {
        return Err(ConfigError::Validation(
            "base_retry_delay must be >= 1ms".to_string(),
        ));
    }

    if config.max_retry_delay < config.base_retry_delay {
        return Err(ConfigError::Validation(format!(
            "max_retry_delay ({}ms) must be >= base_retry_delay ({}ms)",
            config.max_retry_delay, config.base_retry_delay
        )));
    }

    if config.page_timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "page_timeout must be >= 1000ms, got {}ms",
            config.page_timeout
        )));
    }

    if config.idle_timeout > config.page_timeout {
        return Err(ConfigError::Validation(format!(
            "idle_timeout ({}ms) must be <= page_timeout ({}ms)",
            config.idle_timeout, config.page_timeout
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    let path = Path::new(&config.path);
    if path.file_stem().is_none() {
        return Err(ConfigError::Validation(format!(
            "output path '{}' has no file name",
            config.path
        )));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_interval must be >= 1, got {}",
            config.checkpoint_interval
        )));
    }

    Ok(())
}

/// Validates user-supplied container selector overrides
///
/// Only a cheap syntactic check: the selector engine lives behind the driver
/// trait, so full parsing happens there. This catches the obvious mistakes
/// (empty strings, stray commas) at load time.
fn validate_selector_overrides(selectors: &[String]) -> Result<(), ConfigError> {
    for selector in selectors {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidSelector(
                "container selector cannot be empty".to_string(),
            ));
        }
        if trimmed.starts_with(',') || trimmed.ends_with(',') {
            return Err(ConfigError::InvalidSelector(format!(
                "container selector '{}' has a dangling comma",
                selector
            )));
        }
    }
    Ok(())
}
