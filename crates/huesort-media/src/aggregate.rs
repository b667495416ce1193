//! Averaging of per-frame percentages over a clip.

use huesort_models::{ColorProfile, ColorShare};
use thiserror::Error;

use crate::taxonomy::ColorTaxonomy;

/// Every sampled frame failed to decode, so the clip has no profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No frames could be processed")]
pub struct NoFramesProcessed;

/// Running sum of frame percentages for one clip.
#[derive(Debug, Clone)]
pub struct ClipAggregator {
    names: Vec<String>,
    sums: Vec<f64>,
    frames: u32,
}

impl ClipAggregator {
    pub fn new(taxonomy: &ColorTaxonomy) -> Self {
        let names: Vec<String> = taxonomy.names().map(str::to_string).collect();
        let sums = vec![0.0; names.len()];
        Self {
            names,
            sums,
            frames: 0,
        }
    }

    /// Add one frame's percentages, in taxonomy order.
    pub fn add_frame(&mut self, percentages: &[f64]) {
        debug_assert_eq!(percentages.len(), self.sums.len());
        for (sum, pct) in self.sums.iter_mut().zip(percentages) {
            *sum += pct;
        }
        self.frames += 1;
    }

    /// Frames added so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Mean percentage per bucket over the frames actually processed.
    pub fn finish(self) -> Result<ColorProfile, NoFramesProcessed> {
        if self.frames == 0 {
            return Err(NoFramesProcessed);
        }
        let frames = self.frames as f64;
        Ok(ColorProfile::new(
            self.names
                .into_iter()
                .zip(self.sums)
                .map(|(name, sum)| ColorShare::new(name, sum / frames))
                .collect(),
        ))
    }
}
