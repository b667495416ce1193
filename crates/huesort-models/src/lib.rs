//! Shared data models for the huesort colour router.
//!
//! This crate provides Serde-serializable types for:
//! - Colour buckets and hue ranges
//! - The classification/routing configuration
//! - Colour profiles and dominant colour lists
//! - File placement results and per-clip reports
//! - Batch summaries and worker events

pub mod batch;
pub mod clip;
pub mod color;
pub mod config;
pub mod events;
pub mod placement;
pub mod profile;

// Re-export common types
pub use batch::{BatchId, BatchSummary};
pub use clip::{ClipFailure, ClipReport};
pub use color::{ColorBucket, HueRange, HUE_MAX};
pub use config::{
    AchromaticMode, ColorRangeConfig, ConfigError, Configuration, ConflictPolicy, HueSpec,
    MultiColorPolicy,
};
pub use events::{BatchEvent, BatchEventType};
pub use placement::{PlacementOutcome, PlacementResult};
pub use profile::{ColorProfile, ColorShare, DominantColors};
