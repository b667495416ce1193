//! Shared fixtures for worker integration tests.
//!
//! Clips are small JSON files describing their frames, read by
//! [`ScriptedDecoder`] in place of FFmpeg. Placement still copies the real
//! files, so folder layout and conflicts behave as in production.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use huesort_media::{FrameDecoder, MediaError, MediaResult, VideoAsset};

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];
pub const YELLOW: [u8; 3] = [255, 255, 0];

/// Frame-by-frame description of a synthetic clip. `None` frames fail to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipScript {
    pub frames: Vec<Option<[u8; 3]>>,
}

impl ClipScript {
    pub fn solid(color: [u8; 3], frames: usize) -> Self {
        Self {
            frames: vec![Some(color); frames],
        }
    }

    pub fn undecodable(frames: usize) -> Self {
        Self {
            frames: vec![None; frames],
        }
    }

    pub fn split(first: [u8; 3], first_frames: usize, second: [u8; 3], second_frames: usize) -> Self {
        let mut frames = vec![Some(first); first_frames];
        frames.extend(vec![Some(second); second_frames]);
        Self { frames }
    }
}

/// Write a scripted clip and return its path.
pub async fn write_clip(dir: &Path, name: &str, script: &ClipScript) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(&path, serde_json::to_vec(script).unwrap())
        .await
        .unwrap();
    path
}

/// Write a file no decoder can open.
pub async fn write_garbage(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    tokio::fs::write(&path, b"\x00\x00\x00\x18ftypmp42 truncated")
        .await
        .unwrap();
    path
}

/// Decoder that plays back [`ClipScript`] files.
#[derive(Debug, Default)]
pub struct ScriptedDecoder {
    /// Set to `true` whenever a clip is opened
    pub cancel_on_open: Option<watch::Sender<bool>>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling(cancel: watch::Sender<bool>) -> Self {
        Self {
            cancel_on_open: Some(cancel),
        }
    }

    async fn script(path: &Path) -> MediaResult<ClipScript> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MediaError::open_failed(path, e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| MediaError::open_failed(path, e.to_string()))
    }
}

#[async_trait]
impl FrameDecoder for ScriptedDecoder {
    async fn open(&self, path: &Path) -> MediaResult<VideoAsset> {
        let script = Self::script(path).await?;
        if let Some(cancel) = &self.cancel_on_open {
            let _ = cancel.send(true);
        }
        Ok(VideoAsset {
            path: path.to_path_buf(),
            total_frame_count: script.frames.len() as u64,
            fps: 25.0,
            width: 160,
            height: 90,
        })
    }

    async fn decode_frame(
        &self,
        asset: &VideoAsset,
        index: u64,
        width: u32,
        height: u32,
    ) -> MediaResult<RgbImage> {
        let script = Self::script(&asset.path).await?;
        match script.frames.get(index as usize).copied().flatten() {
            Some(rgb) => Ok(RgbImage::from_pixel(width, height, Rgb(rgb))),
            None => Err(MediaError::decode_failed(index, "scripted failure")),
        }
    }
}

/// Drain every event currently queued on the receiver.
pub fn drain<T>(rx: &mut tokio::sync::mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

/// Make `dir` read-only so files in it cannot be removed. Returns false when
/// the process can still write into it (running as root).
#[cfg(unix)]
pub fn lock_dir(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o555)).unwrap();
    let check = dir.join(".write-check");
    let writable = std::fs::write(&check, b"").is_ok();
    if writable {
        let _ = std::fs::remove_file(&check);
        unlock_dir(dir);
    }
    !writable
}

#[cfg(unix)]
pub fn unlock_dir(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).unwrap();
}
