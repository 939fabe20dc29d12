//! Pipeline entry points for crawler operations.
//!
//! - `run_harvester`: Collect company links for each batch into the link table
//! - `run_extractor`: Fetch every linked company page into the detail table

pub mod extract;
pub mod harvest;
pub mod progress;

pub use extract::{ExtractOutcome, extract_all, plan_jobs, run_extractor};
pub use harvest::run_harvester;
pub use progress::ProgressTracker;
