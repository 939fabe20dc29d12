// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod company;
mod config;
mod link;
mod stats;

// Re-export all public types
pub use company::{
    DETAIL_COLUMNS, DetailRecord, ExtractionFailure, ExtractionJob, MISSING,
};
pub(crate) use config::parse_selector;
pub use config::{
    Config, CrawlerConfig, ExtractConfig, HarvestConfig, PathsConfig, RendererConfig,
};
pub use link::LinkRecord;
pub use stats::{ExtractStats, HarvestStats};

/// Column order of the link table.
pub const LINK_COLUMNS: [&str; 2] = ["label", "link"];
