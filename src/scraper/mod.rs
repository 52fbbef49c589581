//! Scraping pipeline
//!
//! This module contains the core pipeline, including:
//! - Request pacing and retry backoff
//! - Error classification
//! - Selector-fallback content extraction
//! - Field normalization
//! - Page navigation and pagination
//! - Overall run orchestration

pub mod classify;
mod extractor;
mod navigator;
mod normalize;
mod orchestrator;
mod rate;
pub mod selectors;

pub use classify::{act, classify as classify_error, is_bot_detection, Action, ErrorContext, PipelineStage, Severity};
pub use extractor::{extract_all, ExtractionReport};
pub use navigator::{AdvanceOutcome, PageNavigator};
pub use normalize::{date, normalize, rating, text, verified};
pub use orchestrator::Orchestrator;
pub use rate::{retry_after_hint, RateScheduler, RetryPolicy};

use crate::browser::{PageDriver, StaticDriver};
use crate::config::Config;
use crate::records::ScrapeOutcome;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Runs a complete scrape with the built-in static page backend
///
/// # Arguments
///
/// * `config` - The validated scrape configuration
///
/// # Returns
///
/// * `Ok(ScrapeOutcome)` - The run finished (possibly with partial data)
/// * `Err(HarvestError)` - The run aborted; partial data was still exported
pub async fn scrape(config: Config) -> Result<ScrapeOutcome> {
    let driver = StaticDriver::new(Duration::from_millis(config.scraper.page_timeout))?;
    scrape_with_driver(config, Arc::new(driver)).await
}

/// Runs a complete scrape against a caller-supplied page driver
///
/// This is the seam for headless-browser backends: anything implementing
/// [`PageDriver`] can drive the same pipeline.
pub async fn scrape_with_driver(
    config: Config,
    driver: Arc<dyn PageDriver>,
) -> Result<ScrapeOutcome> {
    let mut orchestrator = Orchestrator::new(config, driver);
    orchestrator.run().await
}
