//! Frame decoding.
//!
//! [`FrameDecoder`] is the seam between the sampler and whatever reads the
//! video. The production implementation shells out to FFmpeg, seeking to the
//! frame's presentation time and piping one scaled RGB frame back.

use async_trait::async_trait;
use image::RgbImage;
use std::path::Path;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoAsset};

/// Opens clips and decodes individual frames at a requested size.
#[async_trait]
pub trait FrameDecoder: Send + Sync {
    /// Open a clip and report its frame count and geometry.
    async fn open(&self, path: &Path) -> MediaResult<VideoAsset>;

    /// Decode frame `index`, scaled to `width` x `height`.
    async fn decode_frame(
        &self,
        asset: &VideoAsset,
        index: u64,
        width: u32,
        height: u32,
    ) -> MediaResult<RgbImage>;
}

/// FFmpeg-backed decoder.
#[derive(Debug, Clone, Default)]
pub struct FfmpegDecoder {
    runner: FfmpegRunner,
}

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any single FFmpeg invocation that runs longer than `secs`.
    pub fn with_timeout(secs: u64) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(secs),
        }
    }
}

/// Build the command that extracts one frame as packed RGB.
pub fn frame_command(asset: &VideoAsset, index: u64, width: u32, height: u32) -> FfmpegCommand {
    FfmpegCommand::new(&asset.path)
        .seek(asset.timestamp_of(index))
        .single_frame()
        .video_filter(format!("scale={}:{}:flags=area", width, height))
        .raw_rgb_output()
}

#[async_trait]
impl FrameDecoder for FfmpegDecoder {
    async fn open(&self, path: &Path) -> MediaResult<VideoAsset> {
        let info = probe_video(path).await.map_err(|e| match e {
            MediaError::FileNotFound(_) | MediaError::FfprobeNotFound => e,
            other => MediaError::open_failed(path, other.to_string()),
        })?;

        if info.width == 0 || info.height == 0 {
            return Err(MediaError::open_failed(path, "video stream has no dimensions"));
        }

        debug!(
            path = %path.display(),
            frames = info.frame_count,
            fps = info.fps,
            width = info.width,
            height = info.height,
            "Opened clip"
        );

        Ok(VideoAsset::from_info(path, &info))
    }

    async fn decode_frame(
        &self,
        asset: &VideoAsset,
        index: u64,
        width: u32,
        height: u32,
    ) -> MediaResult<RgbImage> {
        let cmd = frame_command(asset, index, width, height);
        let bytes = self
            .runner
            .capture(&cmd)
            .await
            .map_err(|e| MediaError::decode_failed(index, e.to_string()))?;

        let expected = width as usize * height as usize * 3;
        if bytes.len() != expected {
            return Err(MediaError::decode_failed(
                index,
                format!("expected {} bytes of RGB, got {}", expected, bytes.len()),
            ));
        }

        RgbImage::from_raw(width, height, bytes)
            .ok_or_else(|| MediaError::decode_failed(index, "frame buffer has wrong size"))
    }
}
