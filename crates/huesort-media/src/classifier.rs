//! Per-frame colour classification.
//!
//! Every pixel lands in at most one bucket. Achromatic tests run first:
//!
//! 1. `V < value_threshold_black` counts as black.
//! 2. `V > value_threshold_white` and `S < saturation_threshold_white` counts as white.
//! 3. `S < saturation_threshold` is unclassified.
//! 4. Otherwise the first chromatic bucket whose range holds `H`, if any.
//!
//! Percentages are relative to the whole frame, so unclassified pixels leave
//! the profile summing to less than 100.

use huesort_models::{ColorProfile, ColorShare, Configuration};
use image::RgbImage;
use rayon::prelude::*;

use crate::hsv::rgb_to_hsv;
use crate::taxonomy::ColorTaxonomy;

/// Pixels per rayon task.
const CHUNK_PIXELS: usize = 16 * 1024;

/// Thresholds the classifier applies before looking at hue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelThresholds {
    pub saturation: u8,
    pub value_white: u8,
    pub saturation_white: u8,
    pub value_black: u8,
}

impl PixelThresholds {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            saturation: config.saturation_threshold,
            value_white: config.value_threshold_white,
            saturation_white: config.saturation_threshold_white,
            value_black: config.value_threshold_black,
        }
    }
}

impl Default for PixelThresholds {
    fn default() -> Self {
        Self::from_config(&Configuration::default())
    }
}

/// Pixel counts per bucket for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCounts {
    /// One slot per taxonomy bucket, same order
    pub counts: Vec<u64>,
    pub total_pixels: u64,
}

impl PixelCounts {
    pub fn zeroed(buckets: usize) -> Self {
        Self {
            counts: vec![0; buckets],
            total_pixels: 0,
        }
    }

    /// Add another partial count of the same taxonomy.
    pub fn merge(mut self, other: PixelCounts) -> Self {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            *mine += theirs;
        }
        self.total_pixels += other.total_pixels;
        self
    }

    pub fn unclassified(&self) -> u64 {
        self.total_pixels - self.counts.iter().sum::<u64>()
    }

    /// Share of the frame per bucket, in percent.
    pub fn percentages(&self) -> Vec<f64> {
        if self.total_pixels == 0 {
            return vec![0.0; self.counts.len()];
        }
        let total = self.total_pixels as f64;
        self.counts
            .iter()
            .map(|&count| count as f64 * 100.0 / total)
            .collect()
    }

    /// Named profile in taxonomy order.
    pub fn to_profile(&self, taxonomy: &ColorTaxonomy) -> ColorProfile {
        ColorProfile::new(
            taxonomy
                .names()
                .zip(self.percentages())
                .map(|(name, pct)| ColorShare::new(name, pct))
                .collect(),
        )
    }
}

/// Classifies a whole frame into bucket counts.
pub trait FrameClassifier: Send + Sync {
    fn taxonomy(&self) -> &ColorTaxonomy;

    fn count(&self, frame: &RgbImage) -> PixelCounts;

    /// Per-bucket percentages in taxonomy order.
    fn classify(&self, frame: &RgbImage) -> Vec<f64> {
        self.count(frame).percentages()
    }
}

/// HSV threshold classifier, data-parallel over pixel chunks.
#[derive(Debug, Clone)]
pub struct HsvClassifier {
    taxonomy: ColorTaxonomy,
    thresholds: PixelThresholds,
}

impl HsvClassifier {
    pub fn new(taxonomy: ColorTaxonomy, thresholds: PixelThresholds) -> Self {
        Self {
            taxonomy,
            thresholds,
        }
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self::new(
            ColorTaxonomy::from_config(config),
            PixelThresholds::from_config(config),
        )
    }

    /// Bucket index of one pixel, `None` when unclassified.
    #[inline]
    pub fn classify_pixel(&self, r: u8, g: u8, b: u8) -> Option<usize> {
        let hsv = rgb_to_hsv(r, g, b);
        let t = &self.thresholds;

        if hsv.v < t.value_black {
            Some(self.taxonomy.black_index())
        } else if hsv.v > t.value_white && hsv.s < t.saturation_white {
            Some(self.taxonomy.white_index())
        } else if hsv.s < t.saturation {
            None
        } else {
            self.taxonomy.bucket_for_hue(hsv.h)
        }
    }

    fn count_chunk(&self, pixels: &[u8]) -> PixelCounts {
        let mut counts = PixelCounts::zeroed(self.taxonomy.len());
        for px in pixels.chunks_exact(3) {
            if let Some(idx) = self.classify_pixel(px[0], px[1], px[2]) {
                counts.counts[idx] += 1;
            }
            counts.total_pixels += 1;
        }
        counts
    }
}

impl FrameClassifier for HsvClassifier {
    fn taxonomy(&self) -> &ColorTaxonomy {
        &self.taxonomy
    }

    fn count(&self, frame: &RgbImage) -> PixelCounts {
        let buckets = self.taxonomy.len();
        frame
            .as_raw()
            .par_chunks(CHUNK_PIXELS * 3)
            .map(|chunk| self.count_chunk(chunk))
            .reduce(|| PixelCounts::zeroed(buckets), PixelCounts::merge)
    }
}
