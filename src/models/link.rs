//! Link table rows produced by the harvester.

use serde::{Deserialize, Serialize};

/// A detail-page address discovered under a label (batch).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LinkRecord {
    /// Batch the company was listed under (e.g. "Summer 2024")
    pub label: String,

    /// Absolute URL of the company page
    pub link: String,
}

impl LinkRecord {
    pub fn new(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: link.into(),
        }
    }
}
