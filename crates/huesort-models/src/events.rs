//! Events emitted by the batch worker.
//!
//! The interactive front end drains these from a channel on its own schedule.
//! Every clip produces exactly one outcome event: `clip_routed`,
//! `clip_skipped` or `clip_failed`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::batch::{BatchId, BatchSummary};
use crate::profile::ColorShare;

/// Batch event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchEventType {
    BatchStarted,
    ClipStarted,
    FrameProcessed,
    ClipRouted,
    ClipSkipped,
    ClipFailed,
    BatchCompleted,
}

impl BatchEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchEventType::BatchStarted => "batch_started",
            BatchEventType::ClipStarted => "clip_started",
            BatchEventType::FrameProcessed => "frame_processed",
            BatchEventType::ClipRouted => "clip_routed",
            BatchEventType::ClipSkipped => "clip_skipped",
            BatchEventType::ClipFailed => "clip_failed",
            BatchEventType::BatchCompleted => "batch_completed",
        }
    }
}

/// Batch event envelope.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    /// Batch accepted by the worker
    BatchStarted {
        batch_id: BatchId,
        total_clips: usize,
        timestamp: DateTime<Utc>,
    },

    /// Clip analysis started
    ClipStarted {
        /// Zero-based position of the clip in the batch
        index: usize,
        total: usize,
        path: PathBuf,
    },

    /// One sampled frame was classified
    FrameProcessed {
        index: usize,
        frames_processed: u32,
        frames_planned: u32,
    },

    /// Clip copied into its colour folder
    ClipRouted {
        index: usize,
        path: PathBuf,
        colors: Vec<ColorShare>,
        folder: String,
        destination: PathBuf,
        #[serde(default)]
        source_deleted: bool,
    },

    /// Clip not copied because the destination already had it
    ClipSkipped {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    /// Clip could not be placed
    ClipFailed {
        index: usize,
        path: PathBuf,
        message: String,
        /// Where the fallback copy landed, if it succeeded
        #[serde(skip_serializing_if = "Option::is_none")]
        fallback: Option<PathBuf>,
        timestamp: DateTime<Utc>,
    },

    /// Batch finished (or was cancelled between clips)
    BatchCompleted { summary: Box<BatchSummary> },
}

impl BatchEvent {
    pub fn event_type(&self) -> BatchEventType {
        match self {
            BatchEvent::BatchStarted { .. } => BatchEventType::BatchStarted,
            BatchEvent::ClipStarted { .. } => BatchEventType::ClipStarted,
            BatchEvent::FrameProcessed { .. } => BatchEventType::FrameProcessed,
            BatchEvent::ClipRouted { .. } => BatchEventType::ClipRouted,
            BatchEvent::ClipSkipped { .. } => BatchEventType::ClipSkipped,
            BatchEvent::ClipFailed { .. } => BatchEventType::ClipFailed,
            BatchEvent::BatchCompleted { .. } => BatchEventType::BatchCompleted,
        }
    }

    /// Whether this is the single per-clip outcome event.
    pub fn is_clip_outcome(&self) -> bool {
        matches!(
            self.event_type(),
            BatchEventType::ClipRouted | BatchEventType::ClipSkipped | BatchEventType::ClipFailed
        )
    }

    pub fn batch_started(batch_id: BatchId, total_clips: usize) -> Self {
        Self::BatchStarted {
            batch_id,
            total_clips,
            timestamp: Utc::now(),
        }
    }

    pub fn clip_failed(
        index: usize,
        path: PathBuf,
        message: impl Into<String>,
        fallback: Option<PathBuf>,
    ) -> Self {
        Self::ClipFailed {
            index,
            path,
            message: message.into(),
            fallback,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tag() {
        let event = BatchEvent::ClipSkipped {
            index: 2,
            path: PathBuf::from("/src/bg.mp4"),
            reason: "already exists".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "clip_skipped");
        assert_eq!(json["index"], 2);
        assert_eq!(event.event_type().as_str(), "clip_skipped");
        assert!(event.is_clip_outcome());
    }

    #[test]
    fn test_progress_is_not_an_outcome() {
        let event = BatchEvent::FrameProcessed {
            index: 0,
            frames_processed: 1,
            frames_planned: 10,
        };
        assert!(!event.is_clip_outcome());
    }
}
