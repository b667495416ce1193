//! FFprobe video information.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Rate assumed when a stream reports none.
const DEFAULT_FPS: f64 = 30.0;

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Number of frames in the video stream
    pub frame_count: u64,
    /// Video codec
    pub codec: String,
}

/// Read-only handle on an opened clip.
///
/// Owned by the frame sampler for the time one clip is analysed.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAsset {
    pub path: PathBuf,
    pub total_frame_count: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoAsset {
    pub fn from_info(path: impl Into<PathBuf>, info: &VideoInfo) -> Self {
        Self {
            path: path.into(),
            total_frame_count: info.frame_count,
            fps: info.fps,
            width: info.width,
            height: info.height,
        }
    }

    /// Presentation time of frame `index`, in seconds.
    pub fn timestamp_of(&self, index: u64) -> f64 {
        if self.fps > 0.0 {
            index as f64 / self.fps
        } else {
            0.0
        }
    }
}

/// Entries requested from FFprobe; everything else is left out of the report.
const PROBE_ENTRIES: &str = "stream=codec_type,codec_name,width,height,avg_frame_rate,\
r_frame_rate,nb_frames,duration:format=duration";

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Read the first video stream of `path`.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-select_streams", "v:0", "-of", "json"])
        .args(["-show_entries", PROBE_ENTRIES])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(MediaError::FfprobeFailed {
            message: format!("cannot read {}", path.display()),
            stderr: (!stderr.is_empty()).then_some(stderr),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Turn FFprobe JSON into [`VideoInfo`].
fn parse_probe_output(json: &[u8]) -> MediaResult<VideoInfo> {
    let report: ProbeReport = serde_json::from_slice(json)?;

    let stream = report
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("no video stream".to_string()))?;

    // Stream duration is more precise than the container's when present
    let duration = [stream.duration.as_deref(), report.format.duration.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|d| d.parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0))
        .unwrap_or(0.0);

    let fps = [stream.avg_frame_rate.as_deref(), stream.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .find_map(parse_frame_rate)
        .unwrap_or(DEFAULT_FPS);

    // nb_frames is missing for some containers (e.g. raw streams, some mkv)
    let frame_count = match stream.nb_frames.as_deref().map(str::parse::<u64>) {
        Some(Ok(n)) if n > 0 => n,
        _ => (duration * fps).round() as u64,
    };

    Ok(VideoInfo {
        duration,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        fps,
        frame_count,
        codec: stream.codec_name.clone().unwrap_or_default(),
    })
}

/// Frame rate as written by FFprobe: a ratio such as `30000/1001` or a plain number.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => num.trim().parse::<f64>().ok()? / den.trim().parse::<f64>().ok()?,
        None => rate.trim().parse::<f64>().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}
