//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Company link harvesting from batch listings (`LinkHarvester`)
//! - Company detail extraction (`DetailExtractor`)
//! - Embedded page-state parsing (`PayloadParser`)

mod details;
mod links;
mod payload;

pub use details::DetailExtractor;
pub use links::{CrawlState, LinkHarvester};
pub use payload::{ExtractionError, PayloadParser, company_record};

#[cfg(test)]
pub(crate) use links::tests::{LISTING, MockRenderer};
#[cfg(test)]
pub(crate) use payload::tests::company_page;
