//! Per-clip analysis: sample, classify, aggregate, pick a folder.

use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use huesort_media::{
    ClipAggregator, FrameClassifier, FrameDecoder, FrameProgress, FrameSampler, HsvClassifier,
    ProgressCallback,
};
use huesort_models::{ClipFailure, ColorProfile, Configuration, DominantColors};

use crate::routing::{resolve_destination, select_dominant_colors};

/// Everything learned about one clip before it is placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipAnalysis {
    /// Mean share per bucket; empty when no frame was processed
    pub profile: ColorProfile,
    pub dominant_colors: DominantColors,
    /// Folder name under the destination root
    pub folder: String,
    pub frames_planned: u32,
    pub frames_processed: u32,
    pub decode_failures: u32,
    /// Why the clip went to the unidentified folder without a verdict
    pub failure: Option<ClipFailure>,
}

/// Runs the colour pipeline for single clips under one configuration.
pub struct ClipProcessor {
    config: Arc<Configuration>,
    decoder: Arc<dyn FrameDecoder>,
    classifier: Arc<dyn FrameClassifier>,
}

impl ClipProcessor {
    /// Processor using the HSV classifier the configuration describes.
    pub fn new(config: Arc<Configuration>, decoder: Arc<dyn FrameDecoder>) -> Self {
        let classifier = Arc::new(HsvClassifier::from_config(&config));
        Self::with_classifier(config, decoder, classifier)
    }

    pub fn with_classifier(
        config: Arc<Configuration>,
        decoder: Arc<dyn FrameDecoder>,
        classifier: Arc<dyn FrameClassifier>,
    ) -> Self {
        Self {
            config,
            decoder,
            classifier,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Analyse `path` and decide its folder.
    ///
    /// Never fails: an unreadable clip or one without a single decodable
    /// frame is sent to the unidentified folder with the reason attached.
    /// `progress` is called once per classified frame.
    pub async fn process_clip(
        &self,
        path: &Path,
        progress: Option<&ProgressCallback>,
    ) -> ClipAnalysis {
        let config = &self.config;

        let mut sampler = match FrameSampler::open(
            Arc::clone(&self.decoder),
            path,
            config.sample_frame_count,
            config.resize_width,
        )
        .await
        {
            Ok(sampler) => sampler,
            Err(e) => {
                warn!(clip = %path.display(), reason = %e, "Could not open clip");
                return self.unidentified(
                    ClipFailure::OpenFailure {
                        message: e.to_string(),
                    },
                    0,
                    0,
                );
            }
        };

        let planned = sampler.frames_planned();
        let mut aggregator = ClipAggregator::new(self.classifier.taxonomy());
        let mut classify_failures = 0u32;

        while let Some(frame) = sampler.next_frame().await {
            match classify_frame(Arc::clone(&self.classifier), frame).await {
                Ok(percentages) => {
                    aggregator.add_frame(&percentages);
                    if let Some(callback) = progress {
                        callback(FrameProgress::new(aggregator.frames(), planned));
                    }
                }
                Err(e) => {
                    classify_failures += 1;
                    warn!(clip = %path.display(), reason = %e, "Frame classification task failed");
                }
            }
        }

        let decode_failures = sampler.decode_failures() + classify_failures;
        drop(sampler);

        let frames_processed = aggregator.frames();
        let profile = match aggregator.finish() {
            Ok(profile) => profile,
            Err(e) => {
                info!(clip = %path.display(), reason = %e, planned, "No dominant colour");
                let mut analysis =
                    self.unidentified(ClipFailure::NoFramesProcessed, planned, decode_failures);
                analysis.frames_processed = frames_processed;
                return analysis;
            }
        };

        let dominant_colors = select_dominant_colors(&profile, config.min_color_percent);
        let folder = resolve_destination(&dominant_colors, config);

        debug!(
            clip = %path.display(),
            colors = %dominant_colors,
            folder = %folder,
            frames = frames_processed,
            "Clip classified"
        );

        ClipAnalysis {
            profile,
            dominant_colors,
            folder,
            frames_planned: planned,
            frames_processed,
            decode_failures,
            failure: None,
        }
    }

    fn unidentified(&self, failure: ClipFailure, planned: u32, decode_failures: u32) -> ClipAnalysis {
        ClipAnalysis {
            profile: ColorProfile::empty(),
            dominant_colors: DominantColors::default(),
            folder: self.config.unidentified_folder.clone(),
            frames_planned: planned,
            frames_processed: 0,
            decode_failures,
            failure: Some(failure),
        }
    }
}

/// Classify one frame on the blocking pool.
async fn classify_frame(
    classifier: Arc<dyn FrameClassifier>,
    frame: RgbImage,
) -> Result<Vec<f64>, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || classifier.classify(&frame)).await
}
