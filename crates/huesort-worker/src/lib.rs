//! Colour routing worker.
//!
//! This crate provides:
//! - Per-clip analysis and folder routing
//! - Clip discovery under a source directory
//! - A sequential batch executor with event streaming and cancellation
//! - Environment configuration and a swappable colour configuration store
//! - Structured clip logging and metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod routing;
pub mod scan;

pub use config::{load_configuration, ConfigStore, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use executor::{BatchExecutor, BatchHandle, BatchOptions};
pub use logging::ClipLogger;
pub use processor::{ClipAnalysis, ClipProcessor};
pub use routing::{resolve_destination, select_dominant_colors};
pub use scan::discover_clips;
