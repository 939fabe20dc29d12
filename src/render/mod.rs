//! Page rendering abstractions for lazily-loaded listings.
//!
//! A [`Renderer`] owns one browser session for the lifetime of a harvest
//! run. The harvester navigates it label by label, scrolls to pull in more
//! content, and reads back the final markup.

#[cfg(feature = "browser")]
mod chrome;

use async_trait::async_trait;

use crate::error::Result;

#[cfg(feature = "browser")]
pub use chrome::ChromeRenderer;

/// A single, exclusively owned rendering session.
#[async_trait]
pub trait Renderer: Send {
    /// Navigate the session to `url` and wait for the initial render.
    async fn render(&mut self, url: &str) -> Result<()>;

    /// Ask the page for more content (scroll to the bottom).
    async fn trigger_lazy_load(&mut self) -> Result<()>;

    /// Current document height; never decreases while content is appended.
    async fn document_extent(&mut self) -> Result<u64>;

    /// Fully rendered markup of the current document.
    async fn current_markup(&mut self) -> Result<String>;

    /// Release the session. Called exactly once at the end of a run.
    async fn close(&mut self) -> Result<()>;
}
