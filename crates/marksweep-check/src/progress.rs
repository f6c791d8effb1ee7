//! Progress reporting for link checks.

use std::time::Duration;

use marksweep_core::{CheckStatus, LinkCheckResult};

/// Snapshot of an ongoing link check.
#[derive(Debug, Clone, Default)]
pub struct CheckProgress {
    /// Links with a result so far.
    pub checked: usize,
    /// Links in the tree.
    pub total: usize,
    pub alive: usize,
    pub dead: usize,
    pub error: usize,
    pub skipped: usize,
    /// URL of the most recent result.
    pub current_url: Option<String>,
    /// Time since the check started.
    pub elapsed: Duration,
}

impl CheckProgress {
    /// Create a new progress tracker for `total` links.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Count one link's result.
    pub fn record(&mut self, result: &LinkCheckResult) {
        self.checked += 1;
        match result.status {
            CheckStatus::Alive => self.alive += 1,
            CheckStatus::Dead => self.dead += 1,
            CheckStatus::Error => self.error += 1,
            CheckStatus::Skipped => self.skipped += 1,
        }
    }

    /// Dead plus errored links.
    pub fn failures(&self) -> usize {
        self.dead + self.error
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.checked as f64 / self.total as f64) * 100.0
        } else {
            100.0
        }
    }

    /// Check whether every link has a result.
    pub fn is_complete(&self) -> bool {
        self.checked >= self.total
    }
}
