//! Page navigation and pagination probing
//!
//! Drives URL navigation, the lazy-load settle pass, "next page" detection,
//! and the advance click. Navigation failures are reported as values, never
//! raised: the orchestrator owns the decision of what a failed step means
//! for the run.

use crate::browser::{ElementId, NavigateOptions, PageDriver, WaitCondition};
use crate::scraper::selectors::{NEXT_CONTROLS, OVERLAY_CLOSE_CONTROLS};
use std::sync::Arc;
use std::time::Duration;

/// Click attempts before an advance fails closed
const MAX_CLICK_ATTEMPTS: u32 = 3;

/// Height growth treated as "the page actually lazy-loaded content"
const MATERIAL_GROWTH_FACTOR: f64 = 1.10;

const SCROLL_HEIGHT_SCRIPT: &str = "document.body.scrollHeight";
const SCROLL_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";
const SCROLL_TOP_SCRIPT: &str = "window.scrollTo(0, 0)";

/// Result of one advance attempt
#[derive(Debug, Clone)]
pub struct AdvanceOutcome {
    pub success: bool,
    pub has_next_page: bool,
    pub error: Option<String>,
}

/// Navigation collaborator owned by the orchestrator
pub struct PageNavigator {
    driver: Arc<dyn PageDriver>,
    page_timeout: Duration,
    idle_timeout: Duration,
    settle_pause: Duration,
}

impl PageNavigator {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        page_timeout: Duration,
        idle_timeout: Duration,
        settle_pause: Duration,
    ) -> Self {
        Self {
            driver,
            page_timeout,
            idle_timeout,
            settle_pause,
        }
    }

    /// Navigates to `url`; true iff a response with status < 400 arrived
    ///
    /// Logs the request and response; any error yields false rather than
    /// propagating.
    pub async fn navigate(&self, url: &str) -> bool {
        let opts = NavigateOptions {
            wait_condition: WaitCondition::Load,
            timeout: self.page_timeout,
        };

        tracing::info!("Navigating to {}", url);
        match self.driver.navigate(url, &opts).await {
            Ok(outcome) => {
                tracing::info!("Received HTTP {} for {}", outcome.status, url);
                outcome.status < 400
            }
            Err(e) => {
                tracing::warn!("Navigation to {} failed: {}", url, e);
                false
            }
        }
    }

    /// One best-effort lazy-load pass
    ///
    /// Scrolls to the bottom, pauses, and if the page height grew
    /// materially (>10%) pauses again for the new content to stabilize,
    /// then scrolls back to the top. Backends that cannot evaluate script
    /// short-circuit here; that is fine, their documents are already
    /// settled.
    pub async fn settle(&self) {
        let before = match self.driver.evaluate(SCROLL_HEIGHT_SCRIPT).await {
            Ok(value) => value.as_f64(),
            Err(e) => {
                tracing::debug!("Lazy-load settle skipped: {}", e);
                return;
            }
        };

        if let Err(e) = self.driver.evaluate(SCROLL_BOTTOM_SCRIPT).await {
            tracing::debug!("Scroll to bottom failed: {}", e);
            return;
        }
        tokio::time::sleep(self.settle_pause).await;

        let after = self
            .driver
            .evaluate(SCROLL_HEIGHT_SCRIPT)
            .await
            .ok()
            .and_then(|value| value.as_f64());

        if let (Some(before), Some(after)) = (before, after) {
            if after > before * MATERIAL_GROWTH_FACTOR {
                tracing::debug!(
                    "Page height grew {:.0} -> {:.0}, waiting for content to stabilize",
                    before,
                    after
                );
                tokio::time::sleep(self.settle_pause).await;
            }
        }

        if let Err(e) = self.driver.evaluate(SCROLL_TOP_SCRIPT).await {
            tracing::debug!("Scroll to top failed: {}", e);
        }
        tokio::time::sleep(self.settle_pause).await;
    }

    /// Whether a usable "next page" control exists
    ///
    /// A control counts only if it is visible and not disabled.
    pub async fn has_next_page(&self) -> bool {
        self.find_next_control().await.is_some()
    }

    /// Clicks through to the next page
    ///
    /// Dismisses blocking overlays, clicks the same control
    /// `has_next_page` probes (re-dismissing overlays between up to three
    /// attempts), waits for the DOM to be ready, and re-evaluates whether a
    /// further page exists. Fails closed: no control or exhausted clicks
    /// yield `success = false` and `has_next_page = false`.
    pub async fn advance(&self) -> AdvanceOutcome {
        self.dismiss_overlays().await;

        let Some(control) = self.find_next_control().await else {
            return AdvanceOutcome {
                success: false,
                has_next_page: false,
                error: Some("no usable next-page control found".to_string()),
            };
        };

        let mut last_error = None;
        for attempt in 1..=MAX_CLICK_ATTEMPTS {
            match self.driver.click(control).await {
                Ok(()) => {
                    if let Err(e) = self.driver.wait_for_idle(self.idle_timeout).await {
                        tracing::debug!("Idle wait after pagination click: {}", e);
                    }
                    let has_next_page = self.has_next_page().await;
                    return AdvanceOutcome {
                        success: true,
                        has_next_page,
                        error: None,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        "Pagination click attempt {}/{} failed: {}",
                        attempt,
                        MAX_CLICK_ATTEMPTS,
                        e
                    );
                    last_error = Some(e.to_string());
                    self.dismiss_overlays().await;
                }
            }
        }

        AdvanceOutcome {
            success: false,
            has_next_page: false,
            error: last_error,
        }
    }

    /// Finds the first visible, enabled next-page control
    async fn find_next_control(&self) -> Option<ElementId> {
        for candidate in NEXT_CONTROLS {
            let matches = match self.driver.query_all(candidate).await {
                Ok(matches) => matches,
                Err(e) => {
                    tracing::debug!("Next-control candidate '{}' failed: {}", candidate, e);
                    continue;
                }
            };

            for handle in matches {
                if self.control_is_usable(handle).await {
                    tracing::trace!("Next-page control found via '{}'", candidate);
                    return Some(handle);
                }
            }
        }
        None
    }

    async fn control_is_usable(&self, handle: ElementId) -> bool {
        let visible = self.driver.is_visible(handle).await.unwrap_or(false);
        visible && !self.control_is_disabled(handle).await
    }

    /// Disabled means: a disabled attribute, a disabled class, or
    /// `aria-disabled="true"`
    async fn control_is_disabled(&self, handle: ElementId) -> bool {
        if let Ok(Some(_)) = self.driver.attribute(handle, "disabled").await {
            return true;
        }
        if let Ok(Some(class)) = self.driver.attribute(handle, "class").await {
            if class.split_whitespace().any(|c| c.contains("disabled")) {
                return true;
            }
        }
        if let Ok(Some(value)) = self.driver.attribute(handle, "aria-disabled").await {
            if value == "true" {
                return true;
            }
        }
        false
    }

    /// Closes any blocking overlay before interacting with the page
    ///
    /// Tries the close-control candidates first; when none can be clicked,
    /// falls back to an Escape keypress. Always best-effort.
    async fn dismiss_overlays(&self) {
        for candidate in OVERLAY_CLOSE_CONTROLS {
            let matches = match self.driver.query_all(candidate).await {
                Ok(matches) => matches,
                Err(_) => continue,
            };

            for handle in matches {
                if !self.driver.is_visible(handle).await.unwrap_or(false) {
                    continue;
                }
                match self.driver.click(handle).await {
                    Ok(()) => {
                        tracing::debug!("Dismissed overlay via '{}'", candidate);
                        return;
                    }
                    Err(e) => {
                        tracing::trace!("Overlay close via '{}' failed: {}", candidate, e);
                    }
                }
            }
        }

        if let Err(e) = self.driver.press_key("Escape").await {
            tracing::trace!("Escape fallback unavailable: {}", e);
        }
    }
}
