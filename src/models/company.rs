// src/models/company.rs

//! Company detail records and extraction job types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::LinkRecord;

/// Placeholder written for any field missing from the page payload.
pub const MISSING: &str = "N/A";

/// Separator between founder names in the detail table.
const FOUNDER_SEPARATOR: &str = ", ";

/// Column order of the detail table.
pub const DETAIL_COLUMNS: [&str; 10] = [
    "label",
    "link",
    "name",
    "tagline",
    "description",
    "founders",
    "logo_url",
    "location",
    "founded_year",
    "team_size",
];

/// Structured details of one company page.
///
/// Every scalar field holds either the payload value or [`MISSING`], so each
/// row of the detail table has the same width.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailRecord {
    pub label: String,
    pub link: String,
    pub name: String,
    pub tagline: String,
    pub description: String,

    /// Founder display names in page order
    #[serde(
        serialize_with = "serialize_founders",
        deserialize_with = "deserialize_founders"
    )]
    pub founders: Vec<String>,

    pub logo_url: String,
    pub location: String,
    pub founded_year: String,
    pub team_size: String,
}

impl DetailRecord {
    /// A record for `label`/`link` with every payload field missing.
    pub fn empty(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: link.into(),
            name: MISSING.to_string(),
            tagline: MISSING.to_string(),
            description: MISSING.to_string(),
            founders: Vec::new(),
            logo_url: MISSING.to_string(),
            location: MISSING.to_string(),
            founded_year: MISSING.to_string(),
            team_size: MISSING.to_string(),
        }
    }

    /// Founders joined for display, or [`MISSING`] when there are none.
    pub fn founders_display(&self) -> String {
        if self.founders.is_empty() {
            MISSING.to_string()
        } else {
            self.founders.join(FOUNDER_SEPARATOR)
        }
    }
}

/// Founders are stored as a JSON array in a single cell, so names containing
/// the display separator and [`MISSING`] entries survive a read back.
fn serialize_founders<S: Serializer>(founders: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    let cell = serde_json::to_string(founders).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&cell)
}

fn deserialize_founders<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let cell = String::deserialize(deserializer)?;
    serde_json::from_str(&cell).map_err(serde::de::Error::custom)
}

/// One unit of work for the detail extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    /// Position in submission order
    pub index: usize,
    pub label: String,
    pub link: String,
}

impl ExtractionJob {
    pub fn new(index: usize, record: LinkRecord) -> Self {
        Self {
            index,
            label: record.label,
            link: record.link,
        }
    }
}

/// A job that ended without a record.
#[derive(Debug, Clone)]
pub struct ExtractionFailure {
    pub label: String,
    pub link: String,
    pub cause: String,
}
