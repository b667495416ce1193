//! Batch identifiers and summaries.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::clip::ClipReport;
use crate::placement::PlacementOutcome;

/// Unique identifier for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct BatchId(pub String);

impl BatchId {
    /// Generate a new random batch ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final tally of a batch. Produced even when every clip failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummary {
    pub batch_id: BatchId,
    pub total_clips: usize,
    pub copied: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Clips placed per destination folder.
    pub folders: BTreeMap<String, usize>,
    /// Whether the batch stopped early on a cancel request.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub reports: Vec<ClipReport>,
}

impl BatchSummary {
    /// Start an empty summary for a batch of `total_clips`.
    pub fn new(batch_id: BatchId, total_clips: usize) -> Self {
        let now = Utc::now();
        Self {
            batch_id,
            total_clips,
            copied: 0,
            skipped: 0,
            errors: 0,
            folders: BTreeMap::new(),
            cancelled: false,
            started_at: now,
            finished_at: now,
            reports: Vec::new(),
        }
    }

    /// Record a finished clip.
    pub fn record(&mut self, report: ClipReport) {
        match report.outcome() {
            PlacementOutcome::Copied => {
                self.copied += 1;
                *self.folders.entry(report.folder.clone()).or_insert(0) += 1;
            }
            PlacementOutcome::SkippedExists => self.skipped += 1,
            PlacementOutcome::Error => self.errors += 1,
        }
        self.reports.push(report);
    }

    /// Number of clips that produced an outcome.
    pub fn processed(&self) -> usize {
        self.reports.len()
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} clips processed: {} copied, {} skipped, {} errors",
            self.processed(),
            self.total_clips,
            self.copied,
            self.skipped,
            self.errors
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::PlacementResult;
    use crate::profile::DominantColors;
    use std::path::PathBuf;

    fn report(folder: &str, placement: PlacementResult) -> ClipReport {
        ClipReport {
            path: PathBuf::from("/src/a.mp4"),
            dominant_colors: DominantColors::default(),
            folder: folder.to_string(),
            frames_processed: 10,
            decode_failures: 0,
            placement,
            fallback: None,
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let mut summary = BatchSummary::new(BatchId::new(), 3);
        summary.record(report("red", PlacementResult::copied(PathBuf::from("/d/red/a.mp4"))));
        summary.record(report("red", PlacementResult::skipped(PathBuf::from("/d/red/a.mp4"))));
        summary.record(report("blue", PlacementResult::failed("denied")));

        assert_eq!(summary.copied, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.folders.get("red"), Some(&1));
        assert_eq!(summary.folders.get("blue"), None);
        assert_eq!(
            summary.to_string(),
            "3 of 3 clips processed: 1 copied, 1 skipped, 1 errors"
        );
    }

    #[test]
    fn test_batch_id_display() {
        let id = BatchId::from_string("batch-1");
        assert_eq!(id.to_string(), "batch-1");
        assert_eq!(id.as_str(), "batch-1");
    }
}
