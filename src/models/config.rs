//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Directory listing and pagination settings
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Detail page payload settings
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Headless browser settings
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Table file names, relative to the storage directory
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.harvest.labels.is_empty() {
            return Err(AppError::validation("No labels defined"));
        }
        if self.harvest.labels.iter().any(|l| l.trim().is_empty()) {
            return Err(AppError::validation("harvest.labels contains an empty label"));
        }
        if self.harvest.stable_readings == 0 {
            return Err(AppError::validation("harvest.stable_readings must be > 0"));
        }
        if self.harvest.max_scrolls == 0 {
            return Err(AppError::validation("harvest.max_scrolls must be > 0"));
        }
        if !self.harvest.detail_path_prefix.starts_with('/') {
            return Err(AppError::validation(
                "harvest.detail_path_prefix must start with '/'",
            ));
        }
        url::Url::parse(&self.harvest.base_url)?;
        url::Url::parse(&self.harvest.listing_url)?;
        parse_selector(&self.harvest.card_selector)?;
        parse_selector(&self.extract.container_selector())?;
        if self.extract.state_attribute.trim().is_empty() {
            return Err(AppError::validation("extract.state_attribute is empty"));
        }
        Ok(())
    }
}

/// Parse a CSS selector, mapping failures into [`AppError::Selector`].
pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Number of detail pages fetched concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Extra attempts for transient fetch failures (0 disables retries)
    #[serde(default)]
    pub max_retries: u32,

    /// Base backoff between retries, multiplied by the attempt number
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            max_retries: 0,
            retry_backoff_ms: defaults::retry_backoff(),
        }
    }
}

/// Directory listing settings for the link harvester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Site root used to absolutize relative detail links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Listing page; the label is passed as a query parameter
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// Query parameter carrying the label
    #[serde(default = "defaults::label_param")]
    pub label_param: String,

    /// CSS selector for company cards on the listing page
    #[serde(default = "defaults::card_selector")]
    pub card_selector: String,

    /// Path prefix every detail page lives under
    #[serde(default = "defaults::detail_path_prefix")]
    pub detail_path_prefix: String,

    /// Wait after each scroll before measuring the page again
    #[serde(default = "defaults::settle_ms")]
    pub settle_ms: u64,

    /// Consecutive no-growth readings that end pagination
    #[serde(default = "defaults::stable_readings")]
    pub stable_readings: u32,

    /// Upper bound on scrolls for a single label
    #[serde(default = "defaults::max_scrolls")]
    pub max_scrolls: u32,

    /// Labels (batches) in harvesting order
    #[serde(default = "defaults::labels")]
    pub labels: Vec<String>,
}

impl HarvestConfig {
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            listing_url: defaults::listing_url(),
            label_param: defaults::label_param(),
            card_selector: defaults::card_selector(),
            detail_path_prefix: defaults::detail_path_prefix(),
            settle_ms: defaults::settle_ms(),
            stable_readings: defaults::stable_readings(),
            max_scrolls: defaults::max_scrolls(),
            labels: defaults::labels(),
        }
    }
}

/// Embedded application-state settings for detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Substring of the `id` of the element carrying the page state
    #[serde(default = "defaults::state_container_marker")]
    pub state_container_marker: String,

    /// Attribute holding the JSON-encoded state
    #[serde(default = "defaults::state_attribute")]
    pub state_attribute: String,
}

impl ExtractConfig {
    /// CSS selector matching the state container.
    pub fn container_selector(&self) -> String {
        format!(
            "div[id*=\"{}\"]",
            self.state_container_marker.replace('"', "\\\"")
        )
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            state_container_marker: defaults::state_container_marker(),
            state_attribute: defaults::state_attribute(),
        }
    }
}

/// Headless browser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Run the browser without a window
    #[serde(default = "defaults::headless")]
    pub headless: bool,

    /// Explicit Chromium/Chrome binary; auto-detected when unset
    #[serde(default)]
    pub executable: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            headless: defaults::headless(),
            executable: None,
        }
    }
}

/// Table file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::links_file")]
    pub links_file: String,

    #[serde(default = "defaults::details_file")]
    pub details_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            links_file: defaults::links_file(),
            details_file: defaults::details_file(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn max_concurrent() -> usize {
        10
    }
    pub fn retry_backoff() -> u64 {
        1000
    }

    // Harvest defaults
    pub fn base_url() -> String {
        "https://www.ycombinator.com".into()
    }
    pub fn listing_url() -> String {
        "https://www.ycombinator.com/companies".into()
    }
    pub fn label_param() -> String {
        "batch".into()
    }
    pub fn card_selector() -> String {
        "a[class*=\"_company_\"]".into()
    }
    pub fn detail_path_prefix() -> String {
        "/companies/".into()
    }
    pub fn settle_ms() -> u64 {
        3000
    }
    pub fn stable_readings() -> u32 {
        1
    }
    pub fn max_scrolls() -> u32 {
        500
    }

    pub fn labels() -> Vec<String> {
        [
            "Summer 2025",
            "Spring 2025",
            "Winter 2025",
            "Fall 2024",
            "Summer 2024",
            "Winter 2024",
            "Summer 2023",
            "Winter 2023",
            "Summer 2022",
            "Winter 2022",
            "Summer 2021",
            "Winter 2021",
            "Summer 2020",
            "Winter 2020",
            "Summer 2019",
            "Winter 2019",
            "Summer 2018",
            "Winter 2018",
            "Summer 2017",
            "Winter 2017",
            "Summer 2016",
            "Winter 2016",
            "Summer 2015",
            "Winter 2015",
            "Summer 2014",
            "Winter 2014",
            "Summer 2013",
            "Winter 2013",
            "Summer 2012",
            "Winter 2012",
            "Summer 2011",
            "Winter 2011",
            "Summer 2010",
            "Winter 2010",
            "Summer 2009",
            "Winter 2009",
            "Summer 2008",
            "Winter 2008",
            "Summer 2007",
            "Winter 2007",
            "Summer 2006",
            "Winter 2006",
            "Summer 2005",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    // Extract defaults
    pub fn state_container_marker() -> String {
        "ycdc_new/pages/Companies/ShowPage-react-component-".into()
    }
    pub fn state_attribute() -> String {
        "data-page".into()
    }

    // Renderer defaults
    pub fn headless() -> bool {
        true
    }

    // Path defaults
    pub fn links_file() -> String {
        "company_links.csv".into()
    }
    pub fn details_file() -> String {
        "company_details.csv".into()
    }
}
