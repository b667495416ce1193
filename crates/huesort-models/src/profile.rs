//! Per-clip colour profiles and dominant colour lists.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of a single bucket, in percent of all pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorShare {
    pub name: String,
    pub percentage: f64,
}

impl ColorShare {
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }
}

impl fmt::Display for ColorShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}%)", self.name, self.percentage)
    }
}

/// Average bucket shares over every processed frame of one clip.
///
/// Entries follow taxonomy order, one per configured bucket. Percentages use
/// the total pixel count as denominator, so low-saturation grey pixels are
/// left out of every bucket and the sum may stay below 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorProfile {
    entries: Vec<ColorShare>,
}

impl ColorProfile {
    pub fn new(entries: Vec<ColorShare>) -> Self {
        Self { entries }
    }

    /// Profile of a clip where no frame could be analysed.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ColorShare] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorShare> {
        self.entries.iter()
    }

    /// Percentage for `name`, if the bucket exists.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|share| share.name == name)
            .map(|share| share.percentage)
    }

    /// Sum of all bucket percentages.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|share| share.percentage).sum()
    }
}

/// Dominant colours of a clip, highest share first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DominantColors(pub Vec<ColorShare>);

impl DominantColors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The colour with the highest share.
    pub fn top(&self) -> Option<&ColorShare> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorShare> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|share| share.name.as_str()).collect()
    }
}

impl fmt::Display for DominantColors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no dominant colour");
        }
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup_and_total() {
        let profile = ColorProfile::new(vec![
            ColorShare::new("red", 60.0),
            ColorShare::new("blue", 25.5),
            ColorShare::new("preto-branco", 4.5),
        ]);

        assert_eq!(profile.get("blue"), Some(25.5));
        assert_eq!(profile.get("green"), None);
        assert!((profile.total() - 90.0).abs() < 1e-9);
        assert_eq!(profile.len(), 3);
    }

    #[test]
    fn test_dominant_colors_display() {
        let colors = DominantColors(vec![
            ColorShare::new("blue", 55.0),
            ColorShare::new("green", 45.0),
        ]);
        assert_eq!(colors.to_string(), "blue (55.0%), green (45.0%)");
        assert_eq!(colors.top().map(|c| c.name.as_str()), Some("blue"));
        assert_eq!(DominantColors::default().to_string(), "no dominant colour");
    }
}
