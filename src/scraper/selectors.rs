//! Selector candidate tables
//!
//! The target's markup is not contractually stable, so every location
//! strategy is an ordered candidate list tried in sequence rather than a
//! single selector baked into code. New site-structure variants are handled
//! by appending here (or, for containers, by prepending entries in the
//! `[selectors]` config section).

/// Where a field's value is read from once its selector matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// A named attribute on the matched element
    Attribute(&'static str),
    /// The element's text content
    Text,
}

/// One way to locate a field inside a review container
#[derive(Debug, Clone, Copy)]
pub struct FieldLocator {
    pub selector: &'static str,
    pub source: FieldSource,
}

const fn attr(selector: &'static str, name: &'static str) -> FieldLocator {
    FieldLocator {
        selector,
        source: FieldSource::Attribute(name),
    }
}

const fn text(selector: &'static str) -> FieldLocator {
    FieldLocator {
        selector,
        source: FieldSource::Text,
    }
}

/// Review container candidates, most specific first
pub const REVIEW_CONTAINERS: &[&str] = &[
    "[data-hook='review']",
    "[itemprop='review']",
    ".review-item",
    ".review-card",
    "article.review",
    "li.review",
    "div.review",
    ".review-container .review",
    ".review",
];

/// Rating locators; attribute-embedded values come before visible text
/// because star widgets render glyphs, not numbers
pub const RATING_LOCATORS: &[FieldLocator] = &[
    attr("[data-rating]", "data-rating"),
    attr("[itemprop='ratingValue']", "content"),
    attr(".star-rating", "aria-label"),
    attr(".rating", "aria-label"),
    attr(".stars", "title"),
    text(".review-rating"),
    text(".rating-value"),
    text(".rating"),
    text(".stars"),
];

/// Review body locators
pub const TEXT_LOCATORS: &[FieldLocator] = &[
    text("[data-hook='review-body']"),
    text("[itemprop='reviewBody']"),
    text(".review-text"),
    text(".review-body"),
    text(".review-content"),
    text(".review-description"),
];

/// Date locators; machine-readable attributes first
pub const DATE_LOCATORS: &[FieldLocator] = &[
    attr("time[datetime]", "datetime"),
    attr("[data-date]", "data-date"),
    attr("[itemprop='datePublished']", "content"),
    text("[data-hook='review-date']"),
    text(".review-date"),
    text(".date"),
    text("time"),
];

/// Reviewer name locators
pub const REVIEWER_LOCATORS: &[FieldLocator] = &[
    text("[itemprop='author']"),
    text(".reviewer-name"),
    text(".author-name"),
    text(".profile-name"),
    text(".user-nickname"),
    text(".author"),
];

/// Review title locators (optional field)
pub const TITLE_LOCATORS: &[FieldLocator] = &[
    text("[data-hook='review-title']"),
    text(".review-title"),
    text(".review-heading"),
    text("h3"),
    text("h4"),
];

/// Verified-purchase badge locators (optional field)
pub const VERIFIED_LOCATORS: &[FieldLocator] = &[
    text("[data-hook='avp-badge']"),
    text(".verified-purchase"),
    text(".verified-buyer"),
    text(".verified"),
];

/// "Next page" control candidates
pub const NEXT_CONTROLS: &[&str] = &[
    "a[rel='next']",
    "[data-hook='pagination-next'] a",
    "button[aria-label='Next']",
    "a[aria-label='Next']",
    "a[aria-label='Next page']",
    ".pagination-next",
    ".pagination .next a",
    "li.next a",
    "a.next",
    "button.next-page",
];

/// Blocking-overlay close control candidates
pub const OVERLAY_CLOSE_CONTROLS: &[&str] = &[
    "[aria-label='Close']",
    "[data-dismiss='modal']",
    ".modal-close",
    ".overlay-close",
    ".popup-close",
    "button.close",
];

/// Paragraph-level nodes scanned by the review-body fallback
pub const FALLBACK_TEXT_NODES: &str = "p, div, span";

/// Minimum length for a fallback text block to count as a review body
pub const MIN_FALLBACK_TEXT_LEN: usize = 20;
