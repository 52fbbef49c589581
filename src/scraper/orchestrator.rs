//! Top-level scrape orchestration
//!
//! Owns the run state and drives the phase machine:
//!
//! ```text
//! Init -> Navigating -> Settling -> Extracting -> Deduping
//!      -> Checkpointing -> AdvanceCheck -> { Delaying -> Navigating | Done }
//! any phase -> Aborted
//! ```
//!
//! Each transition is a synchronous decision over the outcome of the prior
//! (possibly suspending) step. Failures route through the error classifier;
//! only fatal classifications and retry exhaustion escape the run, and even
//! those export the collected data first.

use crate::browser::PageDriver;
use crate::config::Config;
use crate::output::CsvExporter;
use crate::records::{CanonicalRecord, IdentityKey, PaginationState, RawRecord, ScrapeOutcome};
use crate::scraper::classify::{self, Action, ErrorContext, PipelineStage};
use crate::scraper::extractor;
use crate::scraper::navigator::PageNavigator;
use crate::scraper::normalize;
use crate::scraper::rate::{RateScheduler, RetryPolicy};
use crate::{HarvestError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Phases of the scrape loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Navigating,
    Settling,
    Extracting,
    Deduping,
    Checkpointing,
    AdvanceCheck,
    Delaying,
}

/// Owns the run: one driver handle, one accumulator, one identity set
pub struct Orchestrator {
    config: Config,
    driver: Arc<dyn PageDriver>,
    navigator: PageNavigator,
    scheduler: RateScheduler,
    exporter: CsvExporter,

    records: Vec<CanonicalRecord>,
    seen: HashSet<IdentityKey>,
    errors: Vec<String>,
    pagination: PaginationState,
    pages_processed: u32,

    /// Raw records of the page currently between extraction and dedup
    pending: Vec<RawRecord>,
    seed_navigated: bool,
    stop_requested: bool,
}

impl Orchestrator {
    pub fn new(config: Config, driver: Arc<dyn PageDriver>) -> Self {
        let navigator = PageNavigator::new(
            driver.clone(),
            Duration::from_millis(config.scraper.page_timeout),
            Duration::from_millis(config.scraper.idle_timeout),
            Duration::from_millis(config.scraper.settle_pause),
        );

        Self {
            navigator,
            driver,
            scheduler: RateScheduler::new(),
            exporter: CsvExporter::new(),
            records: Vec::new(),
            seen: HashSet::new(),
            errors: Vec::new(),
            pagination: PaginationState::new(),
            pages_processed: 0,
            pending: Vec::new(),
            seed_navigated: false,
            stop_requested: false,
            config,
        }
    }

    /// Runs the scrape to completion
    ///
    /// Both completion paths (graceful and aborted) export whatever has
    /// accumulated; an aborted run re-raises its originating error after
    /// the export attempt.
    pub async fn run(&mut self) -> Result<ScrapeOutcome> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting scrape of {} (up to {} pages)",
            self.config.target.url,
            self.config.target.max_pages
        );

        let mut phase = Phase::Init;
        let failure: Option<HarvestError> = loop {
            phase = match phase {
                Phase::Init => Phase::Navigating,

                Phase::Navigating => {
                    if !self.seed_navigated {
                        match self.navigate_to_seed().await {
                            Ok(()) => {
                                self.seed_navigated = true;
                                Phase::Settling
                            }
                            Err(e) => break Some(e),
                        }
                    } else {
                        let outcome = self.navigator.advance().await;
                        if outcome.success {
                            self.pagination.advance();
                            if !outcome.has_next_page {
                                self.pagination.exhaust();
                            }
                            Phase::Settling
                        } else {
                            // A failed advance stops pagination, never the
                            // run; everything gathered so far is kept.
                            let reason = outcome
                                .error
                                .unwrap_or_else(|| "unknown".to_string());
                            tracing::warn!(
                                "Could not advance past page {} ({}); stopping with collected data",
                                self.pagination.current_page_index,
                                reason
                            );
                            self.errors.push(format!(
                                "pagination stopped at page {}: {}",
                                self.pagination.current_page_index, reason
                            ));
                            break None;
                        }
                    }
                }

                Phase::Settling => {
                    // Best-effort; a failed settle never aborts anything.
                    self.navigator.settle().await;
                    Phase::Extracting
                }

                Phase::Extracting => match self.extract_current_page().await {
                    Ok(next) => next,
                    Err(e) => break Some(e),
                },

                Phase::Deduping => {
                    self.dedup_pending();
                    self.pages_processed += 1;
                    Phase::Checkpointing
                }

                Phase::Checkpointing => {
                    if self.pages_processed % self.config.output.checkpoint_interval == 0 {
                        self.write_checkpoint();
                    }
                    Phase::AdvanceCheck
                }

                Phase::AdvanceCheck => {
                    if self.stop_requested {
                        break None;
                    }
                    if self.pagination.is_terminal(self.config.target.max_pages) {
                        tracing::info!(
                            "Pagination complete at page {} (cap {})",
                            self.pagination.current_page_index,
                            self.config.target.max_pages
                        );
                        break None;
                    }
                    if !self.navigator.has_next_page().await {
                        tracing::info!("No further pages detected");
                        self.pagination.exhaust();
                        break None;
                    }
                    Phase::Delaying
                }

                Phase::Delaying => {
                    self.scheduler
                        .delay(Duration::from_millis(self.config.scraper.min_request_interval))
                        .await;
                    Phase::Navigating
                }
            };
        };

        let outcome = ScrapeOutcome {
            records: self.records.clone(),
            pages_processed: self.pages_processed,
            errors: self.errors.clone(),
            started_at,
            finished_at: Utc::now(),
        };

        match failure {
            None => {
                let path = self
                    .exporter
                    .export(&outcome.records, &self.config.output.path)?;
                tracing::info!(
                    "Scrape finished: {} reviews from {} pages ({} non-fatal errors) -> {}",
                    outcome.records.len(),
                    outcome.pages_processed,
                    outcome.errors.len(),
                    path.display()
                );
                Ok(outcome)
            }
            Some(error) => {
                // Best-effort export before surfacing the failure.
                match self
                    .exporter
                    .export(&outcome.records, &self.config.output.path)
                {
                    Ok(path) => tracing::info!(
                        "Exported {} partial records to {} before aborting",
                        outcome.records.len(),
                        path.display()
                    ),
                    Err(e) => {
                        tracing::error!("Partial export after failure also failed: {}", e)
                    }
                }
                tracing::error!("Scrape aborted: {}", error);
                Err(error)
            }
        }
    }

    /// Navigates to the seed URL under the configured retry policy
    ///
    /// The retries make short-lived network trouble survivable; once they
    /// are spent a seed that will not load is fatal for the run.
    async fn navigate_to_seed(&mut self) -> Result<()> {
        let policy = RetryPolicy::new(
            self.config.scraper.max_retries,
            Duration::from_millis(self.config.scraper.base_retry_delay),
            Duration::from_millis(self.config.scraper.max_retry_delay),
        );
        let url = &self.config.target.url;
        let navigator = &self.navigator;

        self.scheduler
            .retry_with_backoff(
                move || async move {
                    if navigator.navigate(url).await {
                        Ok(())
                    } else {
                        Err(HarvestError::Navigation {
                            url: url.clone(),
                            message: "no successful response".to_string(),
                        })
                    }
                },
                &policy,
            )
            .await
    }

    /// Runs extraction for the current page and decides the next phase
    async fn extract_current_page(&mut self) -> Result<Phase> {
        let page = self.pagination.current_page_index;

        match extractor::extract_all(self.driver.as_ref(), &self.config.selectors.containers).await
        {
            Ok(report) => {
                self.errors.extend(report.skipped);

                if report.matched_container.is_none() {
                    // Structurally empty page: stop paginating, keep the run.
                    tracing::warn!(
                        "Page {} contained no review structures; stopping pagination",
                        page
                    );
                    self.errors
                        .push(format!("page {}: no review containers found", page));
                    self.stop_requested = true;
                    return Ok(Phase::AdvanceCheck);
                }

                self.pending = report.records;
                Ok(Phase::Deduping)
            }
            Err(e) => {
                let context = ErrorContext::new(PipelineStage::Extraction);
                let structural = matches!(e, HarvestError::Driver(_));

                if classify::act(&e, &context) == Action::Terminate {
                    return Err(e);
                }
                if self.records.is_empty() && structural {
                    // Nothing collected yet and the page machinery itself is
                    // broken: surface it rather than emit an empty dataset.
                    return Err(e);
                }

                tracing::warn!(
                    "Extraction failed on page {} ({}); skipping page and stopping pagination",
                    page,
                    e
                );
                self.errors
                    .push(format!("page {}: extraction failed: {}", page, e));
                self.stop_requested = true;
                Ok(Phase::AdvanceCheck)
            }
        }
    }

    /// Normalizes pending raw records and folds them into the accumulator
    ///
    /// The identity key is inserted before the record is kept, so
    /// re-running extraction over the same page cannot double-insert.
    fn dedup_pending(&mut self) {
        let raw_records = std::mem::take(&mut self.pending);
        let extracted = raw_records.len();
        let mut kept = 0;

        for raw in &raw_records {
            let canonical = normalize::normalize(raw);
            let key = IdentityKey::of(&canonical);
            if self.seen.insert(key) {
                self.records.push(canonical);
                kept += 1;
            }
        }

        tracing::info!(
            "Page {}: {} reviews extracted, {} new after dedup ({} total)",
            self.pagination.current_page_index,
            extracted,
            kept,
            self.records.len()
        );
    }

    /// Persists the accumulator to a checkpoint file
    ///
    /// Checkpoint trouble is logged and recorded but never aborts the run.
    fn write_checkpoint(&mut self) {
        let path = CsvExporter::checkpoint_path(&self.config.output.path, self.pages_processed);
        match self.exporter.export(&self.records, &path.to_string_lossy()) {
            Ok(written) => {
                tracing::info!(
                    "Checkpoint after {} pages -> {}",
                    self.pages_processed,
                    written.display()
                );
            }
            Err(e) => {
                tracing::warn!("Checkpoint write failed: {}", e);
                self.errors.push(format!(
                    "checkpoint after page {} failed: {}",
                    self.pages_processed, e
                ));
            }
        }
    }
}
