//! Per-clip sampling progress.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Progress through the sampled frames of one clip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameProgress {
    /// Frames decoded and classified so far
    pub frames_processed: u32,
    /// Frames the sampler intends to read
    pub frames_planned: u32,
}

impl FrameProgress {
    pub fn new(frames_processed: u32, frames_planned: u32) -> Self {
        Self {
            frames_processed,
            frames_planned,
        }
    }

    /// Calculate progress percentage.
    pub fn percentage(&self) -> f64 {
        if self.frames_planned == 0 {
            return 0.0;
        }
        ((self.frames_processed as f64 / self.frames_planned as f64) * 100.0).min(100.0)
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Arc<dyn Fn(FrameProgress) + Send + Sync + 'static>;
