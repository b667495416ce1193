//! Evenly spaced frame sampling.
//!
//! A [`FrameSampler`] owns the opened [`VideoAsset`] for one clip and yields
//! scaled RGB frames one at a time. Frames that fail to decode are skipped
//! and counted; nothing is retried.

use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::decoder::FrameDecoder;
use crate::error::MediaResult;
use crate::probe::VideoAsset;

/// Counter of frames handed to the classifier.
pub const FRAMES_DECODED_METRIC: &str = "huesort_frames_decoded_total";
/// Counter of sampled frames that could not be decoded.
pub const DECODE_FAILURES_METRIC: &str = "huesort_decode_failures_total";

/// Distance between sampled frame indices.
pub fn sample_stride(total_frame_count: u64, sample_frame_count: u32) -> u64 {
    (total_frame_count / sample_frame_count.max(1) as u64).max(1)
}

/// Frame indices `0, stride, 2 * stride, ...` below `total_frame_count`.
pub fn sample_indices(total_frame_count: u64, sample_frame_count: u32) -> Vec<u64> {
    let stride = sample_stride(total_frame_count, sample_frame_count);
    (0..total_frame_count).step_by(stride as usize).collect()
}

/// Size of a frame scaled to `resize_width`, aspect ratio kept.
///
/// The height is floored and never drops below one pixel.
pub fn scaled_size(width: u32, height: u32, resize_width: u32) -> (u32, u32) {
    let resize_width = resize_width.max(1);
    if width == 0 {
        return (resize_width, height.max(1));
    }
    let scaled = (height as u64 * resize_width as u64) / width as u64;
    (resize_width, (scaled as u32).max(1))
}

/// Lazily decodes the sampled frames of one clip.
pub struct FrameSampler {
    decoder: Arc<dyn FrameDecoder>,
    asset: VideoAsset,
    indices: Vec<u64>,
    cursor: usize,
    target: (u32, u32),
    decode_failures: u32,
}

impl FrameSampler {
    /// Open `path` and plan which frames to read.
    ///
    /// An error here means the clip is unreadable; no frames will be yielded.
    pub async fn open(
        decoder: Arc<dyn FrameDecoder>,
        path: &Path,
        sample_frame_count: u32,
        resize_width: u32,
    ) -> MediaResult<Self> {
        let asset = decoder.open(path).await?;
        let indices = sample_indices(asset.total_frame_count, sample_frame_count);
        let target = scaled_size(asset.width, asset.height, resize_width);

        debug!(
            clip = %path.display(),
            total_frames = asset.total_frame_count,
            planned = indices.len(),
            width = target.0,
            height = target.1,
            "Sampling clip"
        );

        Ok(Self {
            decoder,
            asset,
            indices,
            cursor: 0,
            target,
            decode_failures: 0,
        })
    }

    pub fn asset(&self) -> &VideoAsset {
        &self.asset
    }

    /// Number of frames the sampler will attempt.
    pub fn frames_planned(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Frames skipped so far because they could not be decoded.
    pub fn decode_failures(&self) -> u32 {
        self.decode_failures
    }

    /// Decode the next sampled frame, or `None` once every index was tried.
    pub async fn next_frame(&mut self) -> Option<RgbImage> {
        let (width, height) = self.target;

        while let Some(&index) = self.indices.get(self.cursor) {
            self.cursor += 1;

            match self
                .decoder
                .decode_frame(&self.asset, index, width, height)
                .await
            {
                Ok(frame) if frame.width() == width => {
                    metrics::counter!(FRAMES_DECODED_METRIC).increment(1);
                    return Some(frame);
                }
                Ok(frame) => {
                    trace!(index, got = frame.width(), want = width, "Resizing decoded frame");
                    metrics::counter!(FRAMES_DECODED_METRIC).increment(1);
                    return Some(imageops::resize(&frame, width, height, FilterType::Triangle));
                }
                Err(e) => {
                    self.decode_failures += 1;
                    metrics::counter!(DECODE_FAILURES_METRIC).increment(1);
                    debug!(
                        clip = %self.asset.path.display(),
                        index,
                        error = %e,
                        "Skipping undecodable frame"
                    );
                }
            }
        }

        None
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        trace!(
            clip = %self.asset.path.display(),
            attempted = self.cursor,
            decode_failures = self.decode_failures,
            "Released clip"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use async_trait::async_trait;
    use image::Rgb;
    use std::path::PathBuf;

    struct SolidDecoder {
        frames: u64,
        native: (u32, u32),
        fail_every: Option<u64>,
        ignore_size: bool,
    }

    #[async_trait]
    impl FrameDecoder for SolidDecoder {
        async fn open(&self, path: &Path) -> MediaResult<VideoAsset> {
            Ok(VideoAsset {
                path: path.to_path_buf(),
                total_frame_count: self.frames,
                fps: 25.0,
                width: self.native.0,
                height: self.native.1,
            })
        }

        async fn decode_frame(
            &self,
            _asset: &VideoAsset,
            index: u64,
            width: u32,
            height: u32,
        ) -> MediaResult<RgbImage> {
            if self.fail_every.is_some_and(|n| index % n == 0) {
                return Err(MediaError::decode_failed(index, "corrupt"));
            }
            let (w, h) = if self.ignore_size {
                self.native
            } else {
                (width, height)
            };
            Ok(RgbImage::from_pixel(w, h, Rgb([255, 0, 0])))
        }
    }

    struct BrokenDecoder;

    #[async_trait]
    impl FrameDecoder for BrokenDecoder {
        async fn open(&self, path: &Path) -> MediaResult<VideoAsset> {
            Err(MediaError::open_failed(path, "moov atom not found"))
        }

        async fn decode_frame(
            &self,
            _asset: &VideoAsset,
            index: u64,
            _width: u32,
            _height: u32,
        ) -> MediaResult<RgbImage> {
            Err(MediaError::decode_failed(index, "unreachable"))
        }
    }

    fn solid(frames: u64) -> SolidDecoder {
        SolidDecoder {
            frames,
            native: (1920, 1080),
            fail_every: None,
            ignore_size: false,
        }
    }

    #[test]
    fn test_sample_stride() {
        assert_eq!(sample_stride(300, 10), 30);
        assert_eq!(sample_stride(5, 10), 1);
        assert_eq!(sample_stride(0, 10), 1);
        assert_eq!(sample_stride(100, 0), 100);
    }

    #[test]
    fn test_sample_indices() {
        assert_eq!(sample_indices(100, 10), (0..100).step_by(10).collect::<Vec<_>>());
        assert_eq!(sample_indices(3, 10), vec![0, 1, 2]);
        assert_eq!(sample_indices(25, 10), vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24]);
        assert!(sample_indices(0, 10).is_empty());
    }

    #[test]
    fn test_scaled_size() {
        assert_eq!(scaled_size(1920, 1080, 320), (320, 180));
        assert_eq!(scaled_size(1080, 1920, 320), (320, 568));
        assert_eq!(scaled_size(4000, 2, 320), (320, 1));
    }

    #[tokio::test]
    async fn test_yields_every_planned_frame() {
        let mut sampler = FrameSampler::open(Arc::new(solid(300)), &PathBuf::from("a.mp4"), 10, 320)
            .await
            .unwrap();
        assert_eq!(sampler.frames_planned(), 10);

        let mut yielded = 0;
        while let Some(frame) = sampler.next_frame().await {
            assert_eq!(frame.dimensions(), (320, 180));
            yielded += 1;
        }
        assert_eq!(yielded, 10);
        assert_eq!(sampler.decode_failures(), 0);
        assert!(sampler.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_skips_undecodable_frames() {
        let decoder = SolidDecoder {
            fail_every: Some(20),
            ..solid(100)
        };
        let mut sampler = FrameSampler::open(Arc::new(decoder), Path::new("b.mp4"), 10, 320)
            .await
            .unwrap();

        let mut yielded = 0;
        while sampler.next_frame().await.is_some() {
            yielded += 1;
        }
        // indices 0, 20, 40, 60, 80 fail
        assert_eq!(yielded, 5);
        assert_eq!(sampler.decode_failures(), 5);
    }

    #[tokio::test]
    async fn test_resizes_frames_of_wrong_width() {
        let decoder = SolidDecoder {
            native: (640, 360),
            ignore_size: true,
            ..solid(10)
        };
        let mut sampler = FrameSampler::open(Arc::new(decoder), Path::new("c.mp4"), 10, 320)
            .await
            .unwrap();
        let frame = sampler.next_frame().await.unwrap();
        assert_eq!(frame.dimensions(), (320, 180));
    }

    #[test]
    fn test_open_failure_yields_nothing() {
        let result = tokio_test::block_on(FrameSampler::open(
            Arc::new(BrokenDecoder),
            Path::new("d.mp4"),
            10,
            320,
        ));
        assert!(matches!(result, Err(ref e) if e.is_open_failure()));
    }
}
