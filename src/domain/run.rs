//! Run summary reported back to the CLI.
//!
//! A run is a single pass of classify → converge placeholders → write
//! documents. Nothing here is persisted; the summary is printed and dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome counters for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// Movies releasing inside the horizon
    pub future: usize,

    /// Movies already released but not downloaded
    pub released: usize,

    /// Placeholders created this run
    pub created: usize,

    /// Placeholders that were already on disk
    pub already_present: usize,

    /// Placeholder creations that failed
    pub create_failures: usize,

    /// Placeholder folders inspected during cleanup
    pub checked: usize,

    /// Placeholder folders removed during cleanup
    pub removed: usize,

    /// Bytes freed by removed placeholders
    pub bytes_reclaimed: u64,

    /// Scan/removal failures during cleanup
    pub cleanup_failures: usize,

    /// Whether cleanup ran at all
    pub cleanup_ran: bool,

    /// Whether this was a dry run (no filesystem changes)
    pub dry_run: bool,

    /// Wall-clock duration
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    /// Total classified movies
    pub fn classified(&self) -> usize {
        self.future + self.released
    }

    /// Total per-item failures across the run
    pub fn failures(&self) -> usize {
        self.create_failures + self.cleanup_failures
    }

    /// Elapsed time as HH:MM:SS
    pub fn elapsed_hms(&self) -> String {
        let secs = self.elapsed.as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
