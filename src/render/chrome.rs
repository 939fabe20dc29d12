// src/render/chrome.rs

//! Headless Chromium renderer driven over the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::RendererConfig;
use crate::render::Renderer;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const SCROLL_HEIGHT: &str = "document.body.scrollHeight";

/// [`Renderer`] backed by a single Chromium tab.
pub struct ChromeRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
}

impl ChromeRenderer {
    /// Launch the browser. Fails when no usable Chromium binary is found.
    pub async fn launch(config: &RendererConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(AppError::render)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(AppError::render)?;

        // The CDP event loop has to be polled for the browser to make progress.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::debug!("Browser handler event error: {}", e);
                }
            }
        });

        log::info!("Browser launched (headless: {})", config.headless);

        Ok(Self {
            browser,
            handler,
            page: None,
        })
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| AppError::render("no page has been rendered yet"))
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&mut self, url: &str) -> Result<()> {
        if self.page.is_none() {
            let page = self.browser.new_page(url).await.map_err(AppError::render)?;
            self.page = Some(page);
        } else {
            self.page()?.goto(url).await.map_err(AppError::render)?;
        }
        self.page()?
            .wait_for_navigation()
            .await
            .map_err(AppError::render)?;
        Ok(())
    }

    async fn trigger_lazy_load(&mut self) -> Result<()> {
        self.page()?
            .evaluate(SCROLL_TO_BOTTOM)
            .await
            .map_err(AppError::render)?;
        Ok(())
    }

    async fn document_extent(&mut self) -> Result<u64> {
        let height = self
            .page()?
            .evaluate(SCROLL_HEIGHT)
            .await
            .map_err(AppError::render)?
            .into_value::<f64>()?;
        Ok(height.max(0.0) as u64)
    }

    async fn current_markup(&mut self) -> Result<String> {
        self.page()?.content().await.map_err(AppError::render)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                log::warn!("Failed to close page: {}", e);
            }
        }
        self.browser.close().await.map_err(AppError::render)?;
        self.browser.wait().await?;
        self.handler.abort();
        log::info!("Browser closed");
        Ok(())
    }
}
