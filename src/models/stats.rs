//! Run summaries reported at the end of each pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome counters for a harvest run.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub label_count: usize,
    pub failed_labels: Vec<String>,
    pub empty_labels: Vec<String>,
    pub link_count: usize,
}

impl HarvestStats {
    pub fn new(label_count: usize) -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            label_count,
            failed_labels: Vec::new(),
            empty_labels: Vec::new(),
            link_count: 0,
        }
    }

    pub fn elapsed_secs(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }
}

/// Outcome counters for an extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Jobs submitted after removing repeated link-table rows
    pub job_count: usize,
    pub duplicate_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Rows written to the detail table (0 when nothing succeeded)
    pub rows_written: usize,
}

impl ExtractStats {
    pub fn elapsed_secs(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }

    pub fn success_rate(&self) -> f64 {
        if self.job_count == 0 {
            return 0.0;
        }
        self.success_count as f64 / self.job_count as f64
    }
}
