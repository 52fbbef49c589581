//! Multi-strategy review extraction
//!
//! Locates review containers on the current page and pulls raw field values
//! out of each one, tolerating markup drift through ordered candidate
//! fallback: the first container candidate with at least one match wins,
//! and every field walks its own locator list until a value appears.
//! Extraction never mutates the page.

use crate::browser::{ElementId, PageDriver};
use crate::records::RawRecord;
use crate::scraper::selectors::{
    FieldLocator, FieldSource, DATE_LOCATORS, FALLBACK_TEXT_NODES, MIN_FALLBACK_TEXT_LEN,
    RATING_LOCATORS, REVIEWER_LOCATORS, REVIEW_CONTAINERS, TEXT_LOCATORS, TITLE_LOCATORS,
    VERIFIED_LOCATORS,
};
use crate::Result;

/// Result of extracting one page
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Records in in-page order
    pub records: Vec<RawRecord>,

    /// Warnings for records skipped over missing required fields
    pub skipped: Vec<String>,

    /// The container selector that matched, when any did
    pub matched_container: Option<String>,
}

/// Extracts every review on the current page
///
/// Zero matching containers is not an error: the report comes back empty
/// and the caller decides what an empty page means for pagination. Records
/// missing a required field are skipped individually and noted in
/// `skipped`; only driver-level failures propagate.
pub async fn extract_all(
    driver: &dyn PageDriver,
    extra_containers: &[String],
) -> Result<ExtractionReport> {
    let mut report = ExtractionReport::default();

    let Some((selector, containers)) = find_containers(driver, extra_containers).await? else {
        tracing::warn!("No review containers matched any candidate selector");
        return Ok(report);
    };

    tracing::debug!(
        "Container selector '{}' matched {} elements",
        selector,
        containers.len()
    );
    report.matched_container = Some(selector);

    for (position, container) in containers.iter().enumerate() {
        match extract_record(driver, *container).await? {
            RecordOutcome::Complete(record) => report.records.push(record),
            RecordOutcome::MissingField(field) => {
                let warning = format!(
                    "Skipping review {} on this page: no value for required field '{}'",
                    position + 1,
                    field
                );
                tracing::warn!("{}", warning);
                report.skipped.push(warning);
            }
        }
    }

    Ok(report)
}

/// Finds the first container candidate that matches at least once
///
/// Config-supplied selectors are tried before the built-in table so a
/// site-specific override wins without a code change.
async fn find_containers(
    driver: &dyn PageDriver,
    extra_containers: &[String],
) -> Result<Option<(String, Vec<ElementId>)>> {
    let candidates = extra_containers
        .iter()
        .map(String::as_str)
        .chain(REVIEW_CONTAINERS.iter().copied());

    for candidate in candidates {
        let matches = driver.query_all(candidate).await?;
        if !matches.is_empty() {
            return Ok(Some((candidate.to_string(), matches)));
        }
        tracing::trace!("Container candidate '{}' matched nothing", candidate);
    }

    Ok(None)
}

enum RecordOutcome {
    Complete(RawRecord),
    /// Name of the first required field that could not be located
    MissingField(&'static str),
}

/// Pulls all fields for a single review container
async fn extract_record(driver: &dyn PageDriver, container: ElementId) -> Result<RecordOutcome> {
    let Some(rating) = extract_field(driver, container, RATING_LOCATORS).await? else {
        return Ok(RecordOutcome::MissingField("rating"));
    };

    let text = match extract_field(driver, container, TEXT_LOCATORS).await? {
        Some(text) => Some(text),
        // The review body diverges across site versions more than any other
        // field; fall back to the longest paragraph-level block.
        None => extract_longest_text_block(driver, container).await?,
    };
    let Some(text) = text else {
        return Ok(RecordOutcome::MissingField("text"));
    };

    let Some(date) = extract_field(driver, container, DATE_LOCATORS).await? else {
        return Ok(RecordOutcome::MissingField("date"));
    };

    let Some(reviewer_name) = extract_field(driver, container, REVIEWER_LOCATORS).await? else {
        return Ok(RecordOutcome::MissingField("reviewerName"));
    };

    // Optional fields resolve to None without complaint
    let title = extract_field(driver, container, TITLE_LOCATORS).await?;
    let verified = extract_field(driver, container, VERIFIED_LOCATORS).await?;

    Ok(RecordOutcome::Complete(RawRecord {
        rating,
        text,
        date,
        reviewer_name,
        title,
        verified,
    }))
}

/// Walks a field's locator list and returns the first non-empty value
async fn extract_field(
    driver: &dyn PageDriver,
    container: ElementId,
    locators: &[FieldLocator],
) -> Result<Option<String>> {
    for locator in locators {
        let Some(element) = driver.query_one(container, locator.selector).await? else {
            continue;
        };

        let value = match locator.source {
            FieldSource::Attribute(name) => driver.attribute(element, name).await?,
            FieldSource::Text => Some(driver.text(element).await?),
        };

        if let Some(value) = value {
            let value = value.trim();
            if !value.is_empty() {
                return Ok(Some(value.to_string()));
            }
        }
    }
    Ok(None)
}

/// Last-resort review body: the longest paragraph-level text block inside
/// the container, if it clears the minimum length threshold
async fn extract_longest_text_block(
    driver: &dyn PageDriver,
    container: ElementId,
) -> Result<Option<String>> {
    let nodes = driver.query_all_in(container, FALLBACK_TEXT_NODES).await?;

    let mut longest: Option<String> = None;
    for node in nodes {
        let text = driver.text(node).await?;
        let text = text.trim();
        if text.len() > MIN_FALLBACK_TEXT_LEN
            && longest.as_ref().map_or(true, |l| text.len() > l.len())
        {
            longest = Some(text.to_string());
        }
    }

    if longest.is_some() {
        tracing::debug!("Review body located via paragraph-scan fallback");
    }
    Ok(longest)
}
