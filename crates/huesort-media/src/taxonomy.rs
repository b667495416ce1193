//! Colour taxonomy: named buckets and the hue lookup built from them.

use huesort_models::color::{BLACK_BUCKET, COMBINED_ACHROMATIC_BUCKET, WHITE_BUCKET};
use huesort_models::{AchromaticMode, ColorBucket, Configuration, HueRange, HueSpec, HUE_MAX};
use tracing::warn;

use crate::hsv::rgb_to_hsv;

const HUE_SLOTS: usize = HUE_MAX as usize + 1;

/// Hue interval(s) within `tolerance` of the hue of an RGB colour.
///
/// Near either end of the hue circle the interval wraps and comes back as
/// two disjoint ranges.
pub fn hue_ranges_from_rgb(r: u8, g: u8, b: u8, tolerance: u8) -> Vec<HueRange> {
    let h = rgb_to_hsv(r, g, b).h as i32;
    let t = tolerance as i32;
    let max = HUE_MAX as i32;

    let ranges = if h < t {
        vec![(0, h + t), (max - (t - h), max)]
    } else if h > max - t {
        vec![(h - t, max), (0, t - (max - h))]
    } else {
        vec![(h - t, h + t)]
    };

    ranges
        .into_iter()
        .map(|(min, max_h)| {
            HueRange::new(min.clamp(0, max) as u8, max_h.clamp(0, max) as u8)
        })
        .collect()
}

/// Whether `hue` falls inside any range of `bucket`. Achromatic buckets never match by hue.
pub fn is_color_in_range(hue: u8, bucket: &ColorBucket) -> bool {
    !bucket.is_achromatic && bucket.hue_ranges.iter().any(|r| r.contains(hue))
}

/// A hue shared by more than one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HueOverlap {
    pub hue: u8,
    /// Bucket that wins the hue
    pub winner: String,
    /// Later buckets that also claim it
    pub shadowed: Vec<String>,
}

/// Ordered colour buckets with a precomputed hue lookup.
///
/// Bucket indices are stable for the life of the taxonomy: chromatic buckets
/// first in declaration order, then the achromatic ones.
#[derive(Debug, Clone)]
pub struct ColorTaxonomy {
    buckets: Vec<ColorBucket>,
    hue_lookup: [Option<u16>; HUE_SLOTS],
    black: usize,
    white: usize,
    overlaps: Vec<HueOverlap>,
}

impl ColorTaxonomy {
    /// Build from explicit buckets plus the achromatic buckets for `mode`.
    pub fn new(chromatic: Vec<ColorBucket>, mode: AchromaticMode) -> Self {
        let mut buckets: Vec<ColorBucket> = chromatic
            .into_iter()
            .filter(|b| !b.is_achromatic)
            .collect();

        let (black, white) = match mode {
            AchromaticMode::Combined => {
                buckets.push(ColorBucket::achromatic(COMBINED_ACHROMATIC_BUCKET));
                let idx = buckets.len() - 1;
                (idx, idx)
            }
            AchromaticMode::Split => {
                buckets.push(ColorBucket::achromatic(BLACK_BUCKET));
                buckets.push(ColorBucket::achromatic(WHITE_BUCKET));
                (buckets.len() - 2, buckets.len() - 1)
            }
        };

        let mut hue_lookup = [None; HUE_SLOTS];
        let mut overlaps = Vec::new();
        for hue in 0..=HUE_MAX {
            let mut claimants = buckets
                .iter()
                .enumerate()
                .filter(|(_, b)| is_color_in_range(hue, b));

            if let Some((idx, winner)) = claimants.next() {
                hue_lookup[hue as usize] = Some(idx as u16);
                let shadowed: Vec<String> = claimants.map(|(_, b)| b.name.clone()).collect();
                if !shadowed.is_empty() {
                    overlaps.push(HueOverlap {
                        hue,
                        winner: winner.name.clone(),
                        shadowed,
                    });
                }
            }
        }

        if !overlaps.is_empty() {
            let hues: Vec<String> = overlaps.iter().map(|o| o.hue.to_string()).collect();
            warn!(
                hues = %hues.join(","),
                "Colour buckets overlap; the first declared bucket wins each shared hue"
            );
        }

        Self {
            buckets,
            hue_lookup,
            black,
            white,
            overlaps,
        }
    }

    /// Build the taxonomy a configuration describes. Disabled entries are dropped.
    pub fn from_config(config: &Configuration) -> Self {
        let chromatic = config
            .color_ranges
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| {
                let ranges = match &entry.hue {
                    HueSpec::Ranges { hue_ranges } => hue_ranges.clone(),
                    HueSpec::Center { rgb, tolerance } => {
                        hue_ranges_from_rgb(rgb[0], rgb[1], rgb[2], *tolerance)
                    }
                };
                ColorBucket::chromatic(entry.name.clone(), ranges)
            })
            .collect();

        Self::new(chromatic, config.achromatic_mode)
    }

    pub fn buckets(&self) -> &[ColorBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.name == name)
    }

    /// Bucket that wins `hue`, if any.
    #[inline]
    pub fn bucket_for_hue(&self, hue: u8) -> Option<usize> {
        self.hue_lookup
            .get(hue as usize)
            .copied()
            .flatten()
            .map(|idx| idx as usize)
    }

    /// Index of the bucket dark pixels count towards.
    pub fn black_index(&self) -> usize {
        self.black
    }

    /// Index of the bucket bright unsaturated pixels count towards.
    pub fn white_index(&self) -> usize {
        self.white
    }

    pub fn overlaps(&self) -> &[HueOverlap] {
        &self.overlaps
    }
}

impl Default for ColorTaxonomy {
    fn default() -> Self {
        Self::from_config(&Configuration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huesort_models::ColorRangeConfig;

    #[test]
    fn test_range_from_mid_hue() {
        // pure green, h = 60
        assert_eq!(hue_ranges_from_rgb(0, 255, 0, 30), vec![HueRange::new(30, 90)]);
    }

    #[test]
    fn test_range_wraps_near_zero() {
        // pure red, h = 0
        let ranges = hue_ranges_from_rgb(255, 0, 0, 30);
        assert_eq!(ranges, vec![HueRange::new(0, 30), HueRange::new(149, 179)]);
        assert!(ranges[0].max < ranges[1].min);
    }

    #[test]
    fn test_range_wraps_near_max() {
        // h = 170
        let (r, g, b) = (255, 0, 85);
        assert_eq!(rgb_to_hsv(r, g, b).h, 170);
        let ranges = hue_ranges_from_rgb(r, g, b, 30);
        assert_eq!(ranges, vec![HueRange::new(140, 179), HueRange::new(0, 21)]);
        assert!(ranges[1].max < ranges[0].min);
    }

    #[test]
    fn test_wrapped_ranges_stay_disjoint() {
        for tolerance in [1u8, 10, 30, 89] {
            for (r, g, b) in [(255, 0, 0), (255, 0, 85), (255, 20, 0)] {
                let ranges = hue_ranges_from_rgb(r, g, b, tolerance);
                assert!(ranges.iter().all(|range| range.is_valid()));
                if let [a, b] = ranges.as_slice() {
                    assert!(a.max < b.min || b.max < a.min, "{} overlaps {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_achromatic_bucket_never_matches_hue() {
        let bucket = ColorBucket::achromatic("preto-branco");
        assert!((0..=HUE_MAX).all(|h| !is_color_in_range(h, &bucket)));

        let red = ColorBucket::chromatic("red", vec![HueRange::new(0, 10), HueRange::new(170, 179)]);
        assert!(is_color_in_range(175, &red));
        assert!(!is_color_in_range(11, &red));
    }

    #[test]
    fn test_default_taxonomy_layout() {
        let taxonomy = ColorTaxonomy::default();
        let names: Vec<&str> = taxonomy.names().collect();
        assert_eq!(
            names,
            vec!["red", "orange", "yellow", "green", "cyan", "blue", "violet", "pink", "preto-branco"]
        );
        assert_eq!(taxonomy.black_index(), 8);
        assert_eq!(taxonomy.white_index(), 8);
        assert!(taxonomy.overlaps().is_empty());
        assert_eq!(taxonomy.bucket_for_hue(0), Some(0));
        assert_eq!(taxonomy.bucket_for_hue(175), Some(0));
        assert_eq!(taxonomy.bucket_for_hue(120), Some(5));
        assert_eq!(taxonomy.bucket_for_hue(165), Some(7));
        assert!((0..=HUE_MAX).all(|h| taxonomy.bucket_for_hue(h).is_some()));
    }

    #[test]
    fn test_split_mode_adds_two_buckets() {
        let config = Configuration::default().with_achromatic_mode(AchromaticMode::Split);
        let taxonomy = ColorTaxonomy::from_config(&config);
        assert_eq!(taxonomy.len(), 10);
        assert_eq!(taxonomy.buckets()[taxonomy.black_index()].name, "preto");
        assert_eq!(taxonomy.buckets()[taxonomy.white_index()].name, "branco");
    }

    #[test]
    fn test_first_declared_bucket_wins_overlap() {
        let mut config = Configuration::default();
        config.color_ranges = vec![
            ColorRangeConfig::ranges("warm", vec![HueRange::new(0, 40)]),
            ColorRangeConfig::ranges("yellowish", vec![HueRange::new(30, 50)]),
        ];
        let taxonomy = ColorTaxonomy::from_config(&config);

        assert_eq!(taxonomy.bucket_for_hue(35), taxonomy.index_of("warm"));
        assert_eq!(taxonomy.bucket_for_hue(45), taxonomy.index_of("yellowish"));
        assert_eq!(taxonomy.bucket_for_hue(90), None);
        assert_eq!(taxonomy.overlaps().len(), 11);
        assert_eq!(taxonomy.overlaps()[0].shadowed, vec!["yellowish".to_string()]);
    }

    #[test]
    fn test_disabled_and_centre_entries() {
        let mut config = Configuration::default();
        let mut off = ColorRangeConfig::ranges("off", vec![HueRange::new(0, 179)]);
        off.enabled = false;
        config.color_ranges = vec![off, ColorRangeConfig::center("blueish", [0, 0, 255], 10)];
        let taxonomy = ColorTaxonomy::from_config(&config);

        assert!(taxonomy.index_of("off").is_none());
        assert_eq!(taxonomy.buckets()[0].hue_ranges, vec![HueRange::new(110, 130)]);
    }
}
