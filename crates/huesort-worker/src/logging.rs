//! Structured clip logging utilities.
//!
//! Provides consistent, structured logging for the lifecycle of each clip in
//! a batch, with the batch id and clip path attached to every line.

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{error, info, warn, Span};

use huesort_models::BatchId;

/// Clip logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct ClipLogger {
    batch_id: String,
    clip: String,
    started_at: DateTime<Utc>,
}

impl ClipLogger {
    /// Create a new logger for one clip of a batch.
    pub fn new(batch_id: &BatchId, clip: &Path) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            clip: clip.display().to_string(),
            started_at: Utc::now(),
        }
    }

    /// Log the start of clip analysis.
    pub fn log_start(&self, index: usize, total: usize) {
        info!(
            batch_id = %self.batch_id,
            clip = %self.clip,
            position = index + 1,
            total,
            "Clip started"
        );
    }

    /// Log the clip being copied into its folder.
    pub fn log_routed(&self, folder: &str, percent: Option<f64>) {
        info!(
            batch_id = %self.batch_id,
            clip = %self.clip,
            folder,
            percent = percent.unwrap_or(0.0),
            elapsed_ms = self.elapsed_ms(),
            "Clip routed"
        );
    }

    /// Log the clip being left alone because its destination exists.
    pub fn log_skipped(&self, reason: &str) {
        info!(
            batch_id = %self.batch_id,
            clip = %self.clip,
            reason,
            "Clip skipped"
        );
    }

    /// Log a recoverable problem with the clip.
    pub fn log_warning(&self, reason: &str) {
        warn!(
            batch_id = %self.batch_id,
            clip = %self.clip,
            reason,
            "Clip warning"
        );
    }

    /// Log a clip that could not be placed.
    pub fn log_error(&self, reason: &str) {
        error!(
            batch_id = %self.batch_id,
            clip = %self.clip,
            reason,
            elapsed_ms = self.elapsed_ms(),
            "Clip error"
        );
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn clip(&self) -> &str {
        &self.clip
    }

    /// Milliseconds since the logger was created.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Create a tracing span for this clip.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "clip",
            batch_id = %self.batch_id,
            clip = %self.clip
        )
    }
}
