#![deny(unreachable_patterns)]
//! Frame decoding and colour classification for huesort.
//!
//! This crate provides:
//! - FFmpeg/FFprobe command building and process handling
//! - Lazy, evenly spaced frame sampling behind a [`FrameDecoder`] trait
//! - 8-bit HSV conversion and the configurable colour taxonomy
//! - Parallel per-frame classification and per-clip aggregation
//! - Copying clips into their destination folders

pub mod aggregate;
pub mod classifier;
pub mod command;
pub mod decoder;
pub mod error;
pub mod fs_utils;
pub mod hsv;
pub mod probe;
pub mod progress;
pub mod sampler;
pub mod taxonomy;

pub use aggregate::{ClipAggregator, NoFramesProcessed};
pub use classifier::{FrameClassifier, HsvClassifier, PixelCounts, PixelThresholds};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use decoder::{FfmpegDecoder, FrameDecoder};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{place_file, unique_destination, PlacementOptions};
pub use hsv::{rgb_to_hsv, Hsv};
pub use probe::{probe_video, VideoAsset, VideoInfo};
pub use progress::{FrameProgress, ProgressCallback};
pub use sampler::{sample_indices, sample_stride, scaled_size, FrameSampler};
pub use taxonomy::{hue_ranges_from_rgb, is_color_in_range, ColorTaxonomy, HueOverlap};
