//! Storage abstractions for the link and detail tables.
//!
//! The link table is the only hand-off between the harvester and the
//! extractor. It is append-only: every finished batch adds its rows at the
//! end. The detail table is written once, at the end of an extraction run.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Crawler configuration
//! ├── company_links.csv     # label,link (appended per batch)
//! └── company_details.csv   # one row per extracted company
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DetailRecord, LinkRecord};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for table storage backends.
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Create the link table with its header row unless it already exists.
    async fn init_links(&self) -> Result<()>;

    /// Append one batch of link rows.
    async fn append_links(&self, links: &[LinkRecord]) -> Result<()>;

    /// Load every link row in file order. A missing table is an error.
    async fn load_links(&self) -> Result<Vec<LinkRecord>>;

    /// Replace the detail table with `records`.
    async fn write_details(&self, records: &[DetailRecord]) -> Result<()>;

    /// Load every detail row in file order. A missing table is an error.
    async fn load_details(&self) -> Result<Vec<DetailRecord>>;
}
