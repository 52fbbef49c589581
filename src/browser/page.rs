//! Page driver capability trait
//!
//! The scraping pipeline never talks to a browser runtime directly; it
//! drives this trait. A backend provides navigation, DOM queries, attribute
//! and text reads, clicking, and waiting. Handles returned by queries are
//! opaque and valid only for the document they were produced from.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by page driver backends
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited by server (HTTP 429)")]
    RateLimited { retry_after_seconds: Option<u64> },

    #[error("Timed out waiting for {what} after {timeout_ms}ms")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Stale element handle (page has changed since the query)")]
    StaleHandle,

    #[error("Element not found for handle")]
    NoSuchElement,

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),
}

/// Result type alias for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Opaque handle to an element in the current document
///
/// A handle pairs the element's position with the generation of the
/// document it was resolved against; using it after navigation yields
/// `DriverError::StaleHandle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    generation: u32,
    index: u32,
}

impl ElementId {
    pub fn new(generation: u32, index: u32) -> Self {
        Self { generation, index }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Condition a navigation waits for before resolving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// DOM parsed, subresources may still be loading
    DomContentLoaded,
    /// Full load event
    Load,
    /// No network activity for a short window
    NetworkIdle,
}

/// Options for a navigation request
#[derive(Debug, Clone)]
pub struct NavigateOptions {
    pub wait_condition: WaitCondition,
    pub timeout: Duration,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            wait_condition: WaitCondition::Load,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Result of a completed navigation
#[derive(Debug, Clone, Copy)]
pub struct NavigateOutcome {
    /// HTTP status of the main document response
    pub status: u16,
}

/// Options for selector waits
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub timeout: Duration,
    /// Require the matched element to be visible, not merely attached
    pub visible: bool,
}

/// Browser-automation capability required by the scraping pipeline
///
/// Implementations must be safe to share behind an `Arc`; the pipeline is
/// single-tasked but collaborators hold the driver across await points.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates the page to `url` and returns the main response status
    async fn navigate(&self, url: &str, opts: &NavigateOptions) -> DriverResult<NavigateOutcome>;

    /// URL of the current document, if any navigation has succeeded
    async fn current_url(&self) -> Option<String>;

    /// All elements matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementId>>;

    /// All elements matching `selector` within the subtree of `parent`
    async fn query_all_in(&self, parent: ElementId, selector: &str)
        -> DriverResult<Vec<ElementId>>;

    /// First element matching `selector` within the subtree of `parent`
    async fn query_one(&self, parent: ElementId, selector: &str)
        -> DriverResult<Option<ElementId>>;

    /// Value of attribute `name` on the element, or None when absent
    async fn attribute(&self, element: ElementId, name: &str) -> DriverResult<Option<String>>;

    /// Concatenated text content of the element's subtree
    async fn text(&self, element: ElementId) -> DriverResult<String>;

    /// Clicks the element (for link elements this follows the link)
    async fn click(&self, element: ElementId) -> DriverResult<()>;

    /// Whether the element would be rendered visibly
    async fn is_visible(&self, element: ElementId) -> DriverResult<bool>;

    /// Evaluates a script in page context and returns its JSON value
    async fn evaluate(&self, script: &str) -> DriverResult<serde_json::Value>;

    /// Waits until `selector` matches (optionally visibly)
    async fn wait_for_selector(&self, selector: &str, opts: &WaitOptions) -> DriverResult<()>;

    /// Waits for network/DOM quiescence
    async fn wait_for_idle(&self, timeout: Duration) -> DriverResult<()>;

    /// Sends a keypress to the page (e.g. "Escape")
    async fn press_key(&self, key: &str) -> DriverResult<()>;
}
