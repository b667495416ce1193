//! Worker metrics.
//!
//! Only the `metrics` facade is used here; whichever recorder the host
//! installs receives the values.

use metrics::{counter, histogram};

use huesort_models::PlacementOutcome;

/// Metric names as constants for consistency.
pub mod names {
    pub const CLIPS_PROCESSED_TOTAL: &str = "huesort_clips_processed_total";
    pub const CLIP_DURATION_SECONDS: &str = "huesort_clip_duration_seconds";
    pub const FALLBACK_COPIES_TOTAL: &str = "huesort_fallback_copies_total";
    pub const BATCHES_CANCELLED_TOTAL: &str = "huesort_batches_cancelled_total";
}

/// Record a finished clip.
pub fn record_clip_processed(outcome: PlacementOutcome, duration_secs: f64) {
    let labels = [("outcome", outcome.as_str().to_string())];
    counter!(names::CLIPS_PROCESSED_TOTAL, &labels).increment(1);
    histogram!(names::CLIP_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a fallback copy into the unidentified folder.
pub fn record_fallback_copy(succeeded: bool) {
    let labels = [("succeeded", succeeded.to_string())];
    counter!(names::FALLBACK_COPIES_TOTAL, &labels).increment(1);
}

/// Record a batch stopped before its last clip.
pub fn record_batch_cancelled() {
    counter!(names::BATCHES_CANCELLED_TOTAL).increment(1);
}
