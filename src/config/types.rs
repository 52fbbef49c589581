use serde::Deserialize;

/// Main configuration structure for Review-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorOverrides,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Seed URL of the review listing to scrape
    pub url: String,

    /// Maximum number of listing pages to walk
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,
}

/// Scraper pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Minimum time between page requests (milliseconds)
    #[serde(rename = "min-request-interval", default = "default_min_request_interval")]
    pub min_request_interval: u64,

    /// Maximum retries for a failed operation
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff (milliseconds)
    #[serde(rename = "base-retry-delay", default = "default_base_retry_delay")]
    pub base_retry_delay: u64,

    /// Ceiling for exponential backoff (milliseconds)
    #[serde(rename = "max-retry-delay", default = "default_max_retry_delay")]
    pub max_retry_delay: u64,

    /// Timeout for page operations such as navigation (milliseconds)
    #[serde(rename = "page-timeout", default = "default_page_timeout")]
    pub page_timeout: u64,

    /// Shorter timeout for network-idle waits (milliseconds)
    #[serde(rename = "idle-timeout", default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Pause used by the lazy-load settle pass (milliseconds)
    #[serde(rename = "settle-pause", default = "default_settle_pause")]
    pub settle_pause: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the CSV file to write
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Persist a checkpoint copy every N successfully processed pages
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: u32,
}

/// Optional selector overrides
///
/// Container selectors listed here are tried before the built-in candidate
/// list, so site-specific markup can be handled without a code change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorOverrides {
    #[serde(default)]
    pub containers: Vec<String>,
}

fn default_max_pages() -> u32 {
    50
}

fn default_min_request_interval() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_retry_delay() -> u64 {
    1000
}

fn default_max_retry_delay() -> u64 {
    8000
}

fn default_page_timeout() -> u64 {
    30_000
}

fn default_idle_timeout() -> u64 {
    10_000
}

fn default_settle_pause() -> u64 {
    1500
}

fn default_output_path() -> String {
    "./reviews.csv".to_string()
}

fn default_checkpoint_interval() -> u32 {
    50
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            min_request_interval: default_min_request_interval(),
            max_retries: default_max_retries(),
            base_retry_delay: default_base_retry_delay(),
            max_retry_delay: default_max_retry_delay(),
            page_timeout: default_page_timeout(),
            idle_timeout: default_idle_timeout(),
            settle_pause: default_settle_pause(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            checkpoint_interval: default_checkpoint_interval(),
        }
    }
}
