//! Per-clip failures and reports.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::placement::{PlacementOutcome, PlacementResult};
use crate::profile::DominantColors;

/// Things that can go wrong for a single clip.
///
/// None of these abort a batch. Analysis failures route the clip to the
/// unidentified folder; placement failures are reported on the clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipFailure {
    /// The clip could not be opened or probed.
    OpenFailure { message: String },
    /// Every sampled frame failed to decode.
    NoFramesProcessed,
    /// Writing the clip into its destination failed.
    CopyFailure { message: String },
    /// Removing the source after a successful copy failed.
    DeleteFailure { message: String },
}

impl ClipFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipFailure::OpenFailure { .. } => "open_failure",
            ClipFailure::NoFramesProcessed => "no_frames_processed",
            ClipFailure::CopyFailure { .. } => "copy_failure",
            ClipFailure::DeleteFailure { .. } => "delete_failure",
        }
    }
}

impl fmt::Display for ClipFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipFailure::OpenFailure { message } => write!(f, "could not open clip: {}", message),
            ClipFailure::NoFramesProcessed => write!(f, "no frames could be decoded"),
            ClipFailure::CopyFailure { message } => write!(f, "copy failed: {}", message),
            ClipFailure::DeleteFailure { message } => {
                write!(f, "source removal failed: {}", message)
            }
        }
    }
}

/// Everything the batch learned about one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipReport {
    pub path: PathBuf,
    pub dominant_colors: DominantColors,
    /// Destination folder name chosen by the router.
    pub folder: String,
    pub frames_processed: u32,
    pub decode_failures: u32,
    pub placement: PlacementResult,
    /// Copy into the unidentified folder attempted after a failed placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<PlacementResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ClipFailure>,
}

impl ClipReport {
    pub fn outcome(&self) -> PlacementOutcome {
        self.placement.outcome
    }

    pub fn has_failure(&self, kind: &str) -> bool {
        self.failures.iter().any(|f| f.as_str() == kind)
    }
}
