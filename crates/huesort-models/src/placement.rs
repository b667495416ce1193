//! File placement results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of copying a clip into its destination folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlacementOutcome {
    /// The clip was copied to `destination_path`.
    Copied,
    /// A file with the same name already existed and the skip policy applied.
    SkippedExists,
    /// The copy failed; the source was left untouched.
    Error,
}

impl PlacementOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementOutcome::Copied => "copied",
            PlacementOutcome::SkippedExists => "skipped_exists",
            PlacementOutcome::Error => "error",
        }
    }
}

/// Result of placing one clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlacementResult {
    /// Where the clip ended up (or would have ended up, for a skip).
    pub destination_path: Option<PathBuf>,
    pub outcome: PlacementOutcome,
    /// Copy failure message for [`PlacementOutcome::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the source file was removed after a successful copy.
    #[serde(default)]
    pub source_deleted: bool,
    /// Source removal failure; never changes the outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_error: Option<String>,
}

impl PlacementResult {
    pub fn copied(destination: PathBuf) -> Self {
        Self {
            destination_path: Some(destination),
            outcome: PlacementOutcome::Copied,
            error: None,
            source_deleted: false,
            delete_error: None,
        }
    }

    pub fn skipped(existing: PathBuf) -> Self {
        Self {
            destination_path: Some(existing),
            outcome: PlacementOutcome::SkippedExists,
            error: None,
            source_deleted: false,
            delete_error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            destination_path: None,
            outcome: PlacementOutcome::Error,
            error: Some(message.into()),
            source_deleted: false,
            delete_error: None,
        }
    }

    pub fn is_copied(&self) -> bool {
        self.outcome == PlacementOutcome::Copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_placement_has_no_destination() {
        let result = PlacementResult::failed("disk full");
        assert_eq!(result.outcome, PlacementOutcome::Error);
        assert!(result.destination_path.is_none());
        assert_eq!(result.error.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&PlacementOutcome::SkippedExists).unwrap();
        assert_eq!(json, "\"skipped_exists\"");
    }
}
