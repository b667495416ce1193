//! Colour bucket definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest hue value in the 8-bit HSV space (half-degree units).
pub const HUE_MAX: u8 = 179;

/// Name of the single achromatic bucket used in combined mode.
pub const COMBINED_ACHROMATIC_BUCKET: &str = "preto-branco";
/// Name of the black bucket used in split mode.
pub const BLACK_BUCKET: &str = "preto";
/// Name of the white bucket used in split mode.
pub const WHITE_BUCKET: &str = "branco";

/// Inclusive hue interval over `[0, 179]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct HueRange {
    pub min: u8,
    pub max: u8,
}

impl HueRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Whether `hue` falls inside the interval (both ends inclusive).
    pub fn contains(&self, hue: u8) -> bool {
        self.min <= hue && hue <= self.max
    }

    /// A range is well formed when it is not inverted and stays within the hue space.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max && self.max <= HUE_MAX
    }
}

impl fmt::Display for HueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A named colour bucket.
///
/// Chromatic buckets are matched by hue. Achromatic buckets (black, white, or
/// the combined black-and-white bucket) carry no hue ranges and are matched by
/// value/saturation thresholds before any hue test happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColorBucket {
    pub name: String,
    #[serde(default)]
    pub hue_ranges: Vec<HueRange>,
    #[serde(default)]
    pub is_achromatic: bool,
}

impl ColorBucket {
    pub fn chromatic(name: impl Into<String>, hue_ranges: Vec<HueRange>) -> Self {
        Self {
            name: name.into(),
            hue_ranges,
            is_achromatic: false,
        }
    }

    pub fn achromatic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hue_ranges: Vec::new(),
            is_achromatic: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hue_range_bounds_are_inclusive() {
        let range = HueRange::new(11, 25);
        assert!(range.contains(11));
        assert!(range.contains(25));
        assert!(!range.contains(10));
        assert!(!range.contains(26));
    }

    #[test]
    fn test_hue_range_validity() {
        assert!(HueRange::new(0, 179).is_valid());
        assert!(HueRange::new(40, 40).is_valid());
        assert!(!HueRange::new(50, 40).is_valid());
        assert!(!HueRange::new(170, 180).is_valid());
    }

    #[test]
    fn test_achromatic_bucket_has_no_ranges() {
        let bucket = ColorBucket::achromatic(COMBINED_ACHROMATIC_BUCKET);
        assert!(bucket.is_achromatic);
        assert!(bucket.hue_ranges.is_empty());
    }
}
