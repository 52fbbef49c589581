//! Static page driver backend
//!
//! Implements the [`PageDriver`] capability over `reqwest` + `scraper` for
//! sites that serve their listing markup server-rendered. Navigation is a
//! plain HTTP GET, clicking a link element follows its `href`, and DOM
//! queries run against the fetched document. Script-only operations
//! (`evaluate`, `press_key`) report `Unsupported`, which the pipeline is
//! required to tolerate.
//!
//! An in-memory variant backs tests and offline snapshot processing: it
//! resolves navigations from a URL → HTML map instead of the network.

use crate::browser::page::{
    DriverError, DriverResult, ElementId, NavigateOptions, NavigateOutcome, PageDriver,
    WaitOptions,
};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// User agent sent by the HTTP backend
const USER_AGENT: &str = concat!("review-harvest/", env!("CARGO_PKG_VERSION"));

enum Backend {
    /// Live HTTP fetches
    Http(Client),
    /// URL → HTML map, for tests and saved snapshots
    Memory(HashMap<String, String>),
}

struct PageState {
    current_url: Option<Url>,
    html: String,
    generation: u32,
}

/// `PageDriver` backend for server-rendered pages
pub struct StaticDriver {
    backend: Backend,
    state: Mutex<PageState>,
}

impl StaticDriver {
    /// Creates a live driver with its own HTTP client
    pub fn new(page_timeout: Duration) -> DriverResult<Self> {
        let client = build_http_client(page_timeout)?;
        Ok(Self {
            backend: Backend::Http(client),
            state: Mutex::new(PageState {
                current_url: None,
                html: String::new(),
                generation: 0,
            }),
        })
    }

    /// Creates a driver whose current document is the given HTML
    ///
    /// No navigation is possible; useful for querying saved snapshots.
    pub fn from_html(html: &str) -> Self {
        Self {
            backend: Backend::Memory(HashMap::new()),
            state: Mutex::new(PageState {
                current_url: None,
                html: html.to_string(),
                generation: 1,
            }),
        }
    }

    /// Creates a driver that resolves navigations from an in-memory site map
    pub fn with_pages(pages: HashMap<String, String>) -> Self {
        Self {
            backend: Backend::Memory(pages),
            state: Mutex::new(PageState {
                current_url: None,
                html: String::new(),
                generation: 0,
            }),
        }
    }

    fn install_document(&self, url: Option<Url>, html: String) {
        let mut state = self.state.lock().unwrap();
        state.current_url = url;
        state.html = html;
        state.generation += 1;
    }

    /// Runs `f` against the parsed current document
    ///
    /// The parse is scoped to the closure so the non-`Send` document never
    /// crosses an await point.
    fn with_document<T>(&self, f: impl FnOnce(&PageState, &Html) -> T) -> T {
        let state = self.state.lock().unwrap();
        let doc = Html::parse_document(&state.html);
        f(&state, &doc)
    }

    fn check_generation(state: &PageState, element: ElementId) -> DriverResult<()> {
        if element.generation() != state.generation {
            return Err(DriverError::StaleHandle);
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for StaticDriver {
    async fn navigate(&self, url: &str, opts: &NavigateOptions) -> DriverResult<NavigateOutcome> {
        let parsed = Url::parse(url).map_err(|e| DriverError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        match &self.backend {
            Backend::Http(client) => {
                let response = client
                    .get(parsed)
                    .timeout(opts.timeout)
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_timeout() {
                            DriverError::Timeout {
                                what: format!("navigation to {}", url),
                                timeout_ms: opts.timeout.as_millis() as u64,
                            }
                        } else {
                            DriverError::Http(e)
                        }
                    })?;

                let status = response.status().as_u16();
                if status == 429 {
                    let retry_after_seconds = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse().ok());
                    return Err(DriverError::RateLimited {
                        retry_after_seconds,
                    });
                }

                let final_url = response.url().clone();
                let body = response.text().await?;
                tracing::debug!("Fetched {} ({} bytes, HTTP {})", final_url, body.len(), status);

                self.install_document(Some(final_url), body);
                Ok(NavigateOutcome { status })
            }
            Backend::Memory(pages) => match pages.get(url) {
                Some(html) => {
                    self.install_document(Some(parsed), html.clone());
                    Ok(NavigateOutcome { status: 200 })
                }
                None => Ok(NavigateOutcome { status: 404 }),
            },
        }
    }

    async fn current_url(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.current_url.as_ref().map(ToString::to_string)
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementId>> {
        let compiled = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => {
                // Selector candidates come from fallback lists; a candidate
                // the engine rejects simply does not match.
                tracing::debug!("Ignoring unparseable selector: {}", selector);
                return Ok(Vec::new());
            }
        };

        Ok(self.with_document(|state, doc| {
            let matched: Vec<_> = doc.select(&compiled).map(|m| m.id()).collect();
            indexed_elements(doc)
                .filter(|(_, el)| matched.contains(&el.id()))
                .map(|(i, _)| ElementId::new(state.generation, i))
                .collect()
        }))
    }

    async fn query_all_in(
        &self,
        parent: ElementId,
        selector: &str,
    ) -> DriverResult<Vec<ElementId>> {
        let compiled = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => {
                tracing::debug!("Ignoring unparseable selector: {}", selector);
                return Ok(Vec::new());
            }
        };

        self.with_document(|state, doc| {
            Self::check_generation(state, parent)?;
            let parent_el =
                element_by_index(doc, parent.index()).ok_or(DriverError::NoSuchElement)?;
            let matched: Vec<_> = parent_el.select(&compiled).map(|m| m.id()).collect();
            Ok(indexed_elements(doc)
                .filter(|(_, el)| matched.contains(&el.id()))
                .map(|(i, _)| ElementId::new(state.generation, i))
                .collect())
        })
    }

    async fn query_one(
        &self,
        parent: ElementId,
        selector: &str,
    ) -> DriverResult<Option<ElementId>> {
        let matches = self.query_all_in(parent, selector).await?;
        Ok(matches.into_iter().next())
    }

    async fn attribute(&self, element: ElementId, name: &str) -> DriverResult<Option<String>> {
        self.with_document(|state, doc| {
            Self::check_generation(state, element)?;
            let el = element_by_index(doc, element.index()).ok_or(DriverError::NoSuchElement)?;
            Ok(el.value().attr(name).map(str::to_string))
        })
    }

    async fn text(&self, element: ElementId) -> DriverResult<String> {
        self.with_document(|state, doc| {
            Self::check_generation(state, element)?;
            let el = element_by_index(doc, element.index()).ok_or(DriverError::NoSuchElement)?;
            Ok(el.text().collect::<String>())
        })
    }

    async fn click(&self, element: ElementId) -> DriverResult<()> {
        // Resolve the link target synchronously, then follow it.
        let target = self.with_document(|state, doc| {
            Self::check_generation(state, element)?;
            let el = element_by_index(doc, element.index()).ok_or(DriverError::NoSuchElement)?;

            let href = el.value().attr("href").ok_or(DriverError::Unsupported(
                "click on an element without an href",
            ))?;

            let resolved = match &state.current_url {
                Some(base) => base.join(href),
                None => Url::parse(href),
            };
            resolved.map_err(|e| DriverError::Navigation {
                url: href.to_string(),
                message: e.to_string(),
            })
        })?;

        let opts = NavigateOptions::default();
        let outcome = self.navigate(target.as_str(), &opts).await?;
        if outcome.status >= 400 {
            return Err(DriverError::Navigation {
                url: target.to_string(),
                message: format!("HTTP {}", outcome.status),
            });
        }
        Ok(())
    }

    async fn is_visible(&self, element: ElementId) -> DriverResult<bool> {
        self.with_document(|state, doc| {
            Self::check_generation(state, element)?;
            let el = element_by_index(doc, element.index()).ok_or(DriverError::NoSuchElement)?;
            Ok(element_is_visible(&el))
        })
    }

    async fn evaluate(&self, _script: &str) -> DriverResult<serde_json::Value> {
        Err(DriverError::Unsupported("script evaluation"))
    }

    async fn wait_for_selector(&self, selector: &str, opts: &WaitOptions) -> DriverResult<()> {
        // The document is static, so the wait resolves immediately either way.
        let matches = self.query_all(selector).await?;

        if !opts.visible && !matches.is_empty() {
            return Ok(());
        }
        for m in matches {
            if self.is_visible(m).await? {
                return Ok(());
            }
        }
        Err(DriverError::Timeout {
            what: format!("selector {}", selector),
            timeout_ms: opts.timeout.as_millis() as u64,
        })
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> DriverResult<()> {
        // A fetched document is already quiescent.
        Ok(())
    }

    async fn press_key(&self, _key: &str) -> DriverResult<()> {
        Err(DriverError::Unsupported("key input"))
    }
}

/// Builds the HTTP client used by the live backend
fn build_http_client(page_timeout: Duration) -> DriverResult<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(page_timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(DriverError::Http)
}

/// Yields every element with its document-order index
///
/// Indices are deterministic for a given document string, which is what
/// makes `ElementId` stable across per-operation re-parses.
fn indexed_elements(doc: &Html) -> impl Iterator<Item = (u32, ElementRef<'_>)> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .enumerate()
        .map(|(i, el)| (i as u32, el))
}

/// Returns the element at the given document-order index
fn element_by_index(doc: &Html, index: u32) -> Option<ElementRef<'_>> {
    indexed_elements(doc)
        .find(|(i, _)| *i == index)
        .map(|(_, el)| el)
}

/// Static approximation of visibility
///
/// Without layout we can only honor explicit hiding: the `hidden`
/// attribute, `aria-hidden="true"`, and inline display/visibility styles.
fn element_is_visible(el: &ElementRef<'_>) -> bool {
    let value = el.value();

    if value.attr("hidden").is_some() {
        return false;
    }
    if value.attr("aria-hidden") == Some("true") {
        return false;
    }
    if let Some(style) = value.attr("style") {
        let style = style.replace(' ', "").to_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return false;
        }
    }
    true
}
