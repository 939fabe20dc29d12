//! Completion counter for extraction runs.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts finished jobs against a known total.
///
/// Each job is recorded exactly once, by whoever observes its completion.
/// The counter only feeds log output and the final summary.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Record a successful job; returns its completion number (1-based).
    pub fn record_success(&self) -> usize {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        done
    }

    /// Record a failed job; returns its completion number (1-based).
    pub fn record_failure(&self) -> usize {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.total
    }
}

impl fmt::Display for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed(), self.total)
    }
}
