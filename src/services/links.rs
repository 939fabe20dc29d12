// src/services/links.rs

//! Company link harvesting service.
//!
//! Scrolls a lazily loaded directory listing until the document stops
//! growing, then collects every company card link on the final page.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{HarvestConfig, LinkRecord, parse_selector};
use crate::render::Renderer;
use crate::utils::{listing_url, resolve_url};

/// Pagination progress for one label. Lives only while that label is scrolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlState {
    pub label: String,
    pub last_height: u64,
    /// Consecutive readings without growth
    pub stable_iterations: u32,
    /// Lazy-load triggers issued so far
    pub scrolls: u32,
}

impl CrawlState {
    pub fn new(label: impl Into<String>, initial_height: u64) -> Self {
        Self {
            label: label.into(),
            last_height: initial_height,
            stable_iterations: 0,
            scrolls: 0,
        }
    }

    /// Record the height measured after a scroll. Returns `true` if the page grew.
    pub fn observe(&mut self, height: u64) -> bool {
        self.scrolls += 1;
        if height == self.last_height {
            self.stable_iterations += 1;
            false
        } else {
            self.last_height = height;
            self.stable_iterations = 0;
            true
        }
    }
}

/// Service for collecting company links from batch listing pages.
pub struct LinkHarvester {
    config: HarvestConfig,
    base_url: Url,
    card_selector: Selector,
}

impl LinkHarvester {
    /// Create a new harvester, parsing the configured base URL and selector.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            card_selector: parse_selector(&config.card_selector)?,
            config: config.clone(),
        })
    }

    /// Render the listing for `label`, load it completely, and return its links.
    pub async fn harvest<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        label: &str,
    ) -> Result<Vec<LinkRecord>> {
        let url = listing_url(&self.config.listing_url, &self.config.label_param, label)?;
        log::debug!("Rendering {}", url);
        renderer.render(url.as_str()).await?;

        let state = self.scroll_to_end(renderer, label).await?;
        log::debug!(
            "Batch {} settled at height {} after {} scrolls",
            state.label,
            state.last_height,
            state.scrolls
        );

        let markup = renderer.current_markup().await?;
        Ok(self.extract_links(label, &markup))
    }

    /// Trigger lazy loading until the document height stops changing.
    pub async fn scroll_to_end<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        label: &str,
    ) -> Result<CrawlState> {
        let settle = self.config.settle_interval();
        let mut state = CrawlState::new(label, renderer.document_extent().await?);

        loop {
            renderer.trigger_lazy_load().await?;
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }

            let height = renderer.document_extent().await?;
            if !state.observe(height) && state.stable_iterations >= self.config.stable_readings {
                break;
            }

            if state.scrolls >= self.config.max_scrolls {
                log::warn!(
                    "Batch {} still growing after {} scrolls; using what is loaded",
                    label,
                    state.scrolls
                );
                break;
            }
        }

        Ok(state)
    }

    /// Collect unique company links from rendered listing markup, in document order.
    pub fn extract_links(&self, label: &str, markup: &str) -> Vec<LinkRecord> {
        let document = Html::parse_document(markup);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for card in document.select(&self.card_selector) {
            let Some(href) = card.value().attr("href") else {
                continue;
            };
            let Some(mut url) = resolve_url(&self.base_url, href) else {
                continue;
            };
            if !self.is_detail_url(&url) {
                continue;
            }

            url.set_fragment(None);
            let link = url.to_string();
            if seen.insert(link.clone()) {
                links.push(LinkRecord::new(label, link));
            }
        }

        links
    }

    fn is_detail_url(&self, url: &Url) -> bool {
        let prefix = self.config.detail_path_prefix.as_str();
        url.host_str() == self.base_url.host_str()
            && url.path().starts_with(prefix)
            && url.path().len() > prefix.len()
    }
}
