//! Classification and routing configuration.
//!
//! A [`Configuration`] is an immutable value for the duration of a batch. The
//! settings editor produces a new value (usually serialized as JSON) and the
//! batch driver swaps it in between runs.
//!
//! The defaults reproduce the behaviour the organizer shipped with: ten
//! sampled frames per clip, frames scaled to 320 pixels wide, and a colour
//! must cover at least 20% of the clip to count as dominant.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path};
use thiserror::Error;

use crate::color::{
    HueRange, BLACK_BUCKET, COMBINED_ACHROMATIC_BUCKET, WHITE_BUCKET,
};

/// Default number of frames sampled from each clip.
pub const DEFAULT_SAMPLE_FRAME_COUNT: u32 = 10;
/// Default width frames are scaled to before classification.
pub const DEFAULT_RESIZE_WIDTH: u32 = 320;
/// Default minimum share (percent) for a colour to be dominant.
pub const DEFAULT_MIN_COLOR_PERCENT: f64 = 20.0;
/// Default share the top colour must exceed to win a multi-colour clip.
pub const DEFAULT_MAJORITY_THRESHOLD: f64 = 50.0;
/// Default hue tolerance when a bucket is defined by an RGB centre.
pub const DEFAULT_HUE_TOLERANCE: u8 = 30;
/// Largest tolerance that still keeps a wrapped range split in two disjoint parts.
pub const MAX_HUE_TOLERANCE: u8 = 89;

/// Folder for clips with several colours and no clear winner.
pub const DEFAULT_MIXED_FOLDER: &str = "colorido";
/// Folder for clips without any dominant colour or that failed analysis.
pub const DEFAULT_UNIDENTIFIED_FOLDER: &str = "nao_identificado";

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("Invalid hue range {range} for bucket '{bucket}'")]
    InvalidHueRange { bucket: String, range: HueRange },

    #[error("Duplicate colour bucket '{0}'")]
    DuplicateBucket(String),

    #[error("Bucket name '{0}' is reserved")]
    ReservedName(String),

    #[error("'{name}' in {field} is not a plain folder name")]
    InvalidFolderName { field: &'static str, name: String },

    #[error("Configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// How black and white pixels are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AchromaticMode {
    /// One `preto-branco` bucket collects both dark and bright unsaturated pixels.
    #[default]
    Combined,
    /// Separate `preto` and `branco` buckets.
    Split,
}

impl AchromaticMode {
    /// Achromatic bucket names in the order they are appended to the taxonomy.
    pub fn bucket_names(&self) -> &'static [&'static str] {
        match self {
            AchromaticMode::Combined => &[COMBINED_ACHROMATIC_BUCKET],
            AchromaticMode::Split => &[BLACK_BUCKET, WHITE_BUCKET],
        }
    }
}

/// Where clips with more than one dominant colour go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MultiColorPolicy {
    /// The top colour wins if it exceeds the majority threshold, otherwise
    /// the clip goes to the mixed folder.
    #[default]
    Majority,
    /// The folder is named after every qualifying colour, sorted and joined.
    JoinedNames,
}

/// What to do when the destination file already exists and overwrite is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Leave the existing file alone and report the clip as skipped.
    #[default]
    Skip,
    /// Write under the first free `name(n).ext`.
    Suffix,
}

/// Hue definition of a chromatic bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum HueSpec {
    /// Explicit hue intervals.
    Ranges { hue_ranges: Vec<HueRange> },
    /// An RGB centre widened by a hue tolerance on both sides.
    Center {
        rgb: [u8; 3],
        #[serde(default = "default_tolerance")]
        tolerance: u8,
    },
}

/// One chromatic bucket as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColorRangeConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub hue: HueSpec,
}

impl ColorRangeConfig {
    pub fn ranges(name: impl Into<String>, hue_ranges: Vec<HueRange>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            hue: HueSpec::Ranges { hue_ranges },
        }
    }

    pub fn center(name: impl Into<String>, rgb: [u8; 3], tolerance: u8) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            hue: HueSpec::Center { rgb, tolerance },
        }
    }
}

/// Classification and routing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Configuration {
    /// Number of frames to sample from each clip.
    #[serde(default = "default_sample_frame_count", alias = "sample_frames")]
    pub sample_frame_count: u32,

    /// Width frames are scaled to before classification (aspect ratio kept).
    #[serde(default = "default_resize_width")]
    pub resize_width: u32,

    /// Minimum average share (percent) for a colour to be dominant.
    #[serde(default = "default_min_color_percent")]
    pub min_color_percent: f64,

    /// Pixels below this saturation are unclassified grey.
    #[serde(default = "default_saturation_threshold")]
    pub saturation_threshold: u8,

    /// Pixels brighter than this (and unsaturated) are white.
    #[serde(default = "default_value_threshold_white")]
    pub value_threshold_white: u8,

    /// Maximum saturation for a bright pixel to count as white.
    #[serde(default = "default_saturation_threshold_white")]
    pub saturation_threshold_white: u8,

    /// Pixels darker than this are black.
    #[serde(default = "default_value_threshold_black")]
    pub value_threshold_black: u8,

    /// Recognised clip extensions, matched case-insensitively, scanned in order.
    #[serde(default = "default_supported_extensions", alias = "supported_formats")]
    pub supported_extensions: Vec<String>,

    /// Chromatic buckets in declaration order (first match wins).
    #[serde(default = "default_color_ranges")]
    pub color_ranges: Vec<ColorRangeConfig>,

    #[serde(default)]
    pub achromatic_mode: AchromaticMode,

    #[serde(default)]
    pub multi_color_policy: MultiColorPolicy,

    /// Share the top colour must strictly exceed under [`MultiColorPolicy::Majority`].
    #[serde(default = "default_majority_threshold")]
    pub majority_threshold: f64,

    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    #[serde(default = "default_mixed_folder")]
    pub mixed_folder: String,

    #[serde(default = "default_unidentified_folder")]
    pub unidentified_folder: String,
}

fn default_sample_frame_count() -> u32 {
    DEFAULT_SAMPLE_FRAME_COUNT
}
fn default_resize_width() -> u32 {
    DEFAULT_RESIZE_WIDTH
}
fn default_min_color_percent() -> f64 {
    DEFAULT_MIN_COLOR_PERCENT
}
fn default_saturation_threshold() -> u8 {
    30
}
fn default_value_threshold_white() -> u8 {
    200
}
fn default_saturation_threshold_white() -> u8 {
    30
}
fn default_value_threshold_black() -> u8 {
    30
}
fn default_supported_extensions() -> Vec<String> {
    [".mp4", ".mov", ".avi", ".m4v"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}
fn default_color_ranges() -> Vec<ColorRangeConfig> {
    vec![
        ColorRangeConfig::ranges("red", vec![HueRange::new(0, 10), HueRange::new(170, 179)]),
        ColorRangeConfig::ranges("orange", vec![HueRange::new(11, 25)]),
        ColorRangeConfig::ranges("yellow", vec![HueRange::new(26, 35)]),
        ColorRangeConfig::ranges("green", vec![HueRange::new(36, 85)]),
        ColorRangeConfig::ranges("cyan", vec![HueRange::new(86, 100)]),
        ColorRangeConfig::ranges("blue", vec![HueRange::new(101, 140)]),
        ColorRangeConfig::ranges("violet", vec![HueRange::new(141, 160)]),
        // Hue 170 already belongs to red.
        ColorRangeConfig::ranges("pink", vec![HueRange::new(161, 169)]),
    ]
}
fn default_majority_threshold() -> f64 {
    DEFAULT_MAJORITY_THRESHOLD
}
fn default_mixed_folder() -> String {
    DEFAULT_MIXED_FOLDER.to_string()
}
fn default_unidentified_folder() -> String {
    DEFAULT_UNIDENTIFIED_FOLDER.to_string()
}
fn default_tolerance() -> u8 {
    DEFAULT_HUE_TOLERANCE
}
fn default_true() -> bool {
    true
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            sample_frame_count: DEFAULT_SAMPLE_FRAME_COUNT,
            resize_width: DEFAULT_RESIZE_WIDTH,
            min_color_percent: DEFAULT_MIN_COLOR_PERCENT,
            saturation_threshold: default_saturation_threshold(),
            value_threshold_white: default_value_threshold_white(),
            saturation_threshold_white: default_saturation_threshold_white(),
            value_threshold_black: default_value_threshold_black(),
            supported_extensions: default_supported_extensions(),
            color_ranges: default_color_ranges(),
            achromatic_mode: AchromaticMode::default(),
            multi_color_policy: MultiColorPolicy::default(),
            majority_threshold: DEFAULT_MAJORITY_THRESHOLD,
            conflict_policy: ConflictPolicy::default(),
            mixed_folder: default_mixed_folder(),
            unidentified_folder: default_unidentified_folder(),
        }
    }
}

impl Configuration {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Configuration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder-style setter for the achromatic mode.
    pub fn with_achromatic_mode(mut self, mode: AchromaticMode) -> Self {
        self.achromatic_mode = mode;
        self
    }

    /// Builder-style setter for the multi-colour policy.
    pub fn with_multi_color_policy(mut self, policy: MultiColorPolicy) -> Self {
        self.multi_color_policy = policy;
        self
    }

    /// Builder-style setter for the conflict policy.
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Builder-style setter for the sampled frame count.
    pub fn with_sample_frame_count(mut self, count: u32) -> Self {
        self.sample_frame_count = count;
        self
    }

    /// Builder-style setter for the dominant-colour threshold.
    pub fn with_min_color_percent(mut self, percent: f64) -> Self {
        self.min_color_percent = percent;
        self
    }

    /// Whether `path` carries one of the supported extensions (case-insensitive).
    pub fn is_supported_path(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.supported_extensions
            .iter()
            .any(|supported| normalize_extension(supported).eq_ignore_ascii_case(ext))
    }

    /// Check every field for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_frame_count == 0 {
            return Err(ConfigError::invalid("sample_frame_count", "must be at least 1"));
        }
        if self.resize_width == 0 {
            return Err(ConfigError::invalid("resize_width", "must be at least 1"));
        }
        if !(self.min_color_percent > 0.0 && self.min_color_percent <= 100.0) {
            return Err(ConfigError::invalid(
                "min_color_percent",
                format!("{} is outside (0, 100]", self.min_color_percent),
            ));
        }
        if !(0.0..=100.0).contains(&self.majority_threshold) {
            return Err(ConfigError::invalid(
                "majority_threshold",
                format!("{} is outside [0, 100]", self.majority_threshold),
            ));
        }
        if self.supported_extensions.is_empty() {
            return Err(ConfigError::invalid("supported_extensions", "list is empty"));
        }
        if self
            .supported_extensions
            .iter()
            .any(|ext| normalize_extension(ext).is_empty())
        {
            return Err(ConfigError::invalid("supported_extensions", "empty extension"));
        }
        if self.mixed_folder.trim().is_empty() {
            return Err(ConfigError::invalid("mixed_folder", "must not be empty"));
        }
        if self.unidentified_folder.trim().is_empty() {
            return Err(ConfigError::invalid("unidentified_folder", "must not be empty"));
        }
        check_folder_name("mixed_folder", &self.mixed_folder)?;
        check_folder_name("unidentified_folder", &self.unidentified_folder)?;

        let mut seen: HashSet<&str> = self.achromatic_mode.bucket_names().iter().copied().collect();
        for entry in &self.color_ranges {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::invalid("color_ranges", "bucket name is empty"));
            }
            check_folder_name("color_ranges", &entry.name)?;
            if entry.name == self.mixed_folder || entry.name == self.unidentified_folder {
                return Err(ConfigError::ReservedName(entry.name.clone()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateBucket(entry.name.clone()));
            }
            match &entry.hue {
                HueSpec::Ranges { hue_ranges } => {
                    if let Some(range) = hue_ranges.iter().find(|r| !r.is_valid()) {
                        return Err(ConfigError::InvalidHueRange {
                            bucket: entry.name.clone(),
                            range: *range,
                        });
                    }
                }
                HueSpec::Center { tolerance, .. } => {
                    if *tolerance > MAX_HUE_TOLERANCE {
                        return Err(ConfigError::invalid(
                            "tolerance",
                            format!(
                                "{} exceeds {} for bucket '{}'",
                                tolerance, MAX_HUE_TOLERANCE, entry.name
                            ),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Folder names are joined onto the destination root, so each must be a
/// single normal path component.
fn check_folder_name(field: &'static str, name: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(ConfigError::InvalidFolderName {
            field,
            name: name.to_string(),
        }),
    }
}

/// Strip the leading dot of a configured extension.
fn normalize_extension(ext: &str) -> &str {
    ext.trim().trim_start_matches('.')
}
