//! Worker configuration.
//!
//! Two layers: [`WorkerConfig`] comes from the environment and says where
//! clips are read from and written to, while the classification
//! [`Configuration`] is loaded from JSON and held by a [`ConfigStore`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use huesort_media::PlacementOptions;
use huesort_models::Configuration;
use tokio::sync::watch;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Default per-invocation FFmpeg timeout in seconds.
pub const DEFAULT_FFMPEG_TIMEOUT_SECS: u64 = 60;

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Directory scanned for clips
    pub source_dir: PathBuf,
    /// Root of the colour folders
    pub dest_dir: PathBuf,
    /// Replace clips that already exist at the destination
    pub overwrite: bool,
    /// Remove each source clip after it was copied
    pub delete_source: bool,
    /// JSON classification configuration; built-in defaults when unset
    pub config_path: Option<PathBuf>,
    /// Kill a single FFmpeg invocation after this many seconds
    pub ffmpeg_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            dest_dir: PathBuf::from("./sorted"),
            overwrite: false,
            delete_source: false,
            config_path: None,
            ffmpeg_timeout_secs: DEFAULT_FFMPEG_TIMEOUT_SECS,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            source_dir: std::env::var("HUESORT_SOURCE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_dir),
            dest_dir: std::env::var("HUESORT_DEST_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dest_dir),
            overwrite: std::env::var("HUESORT_OVERWRITE")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(false),
            delete_source: std::env::var("HUESORT_DELETE_SOURCE")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(false),
            config_path: std::env::var("HUESORT_CONFIG")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            ffmpeg_timeout_secs: std::env::var("HUESORT_FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_FFMPEG_TIMEOUT_SECS),
        }
    }

    /// Placement options for a batch run under `config`.
    pub fn placement_options(&self, config: &Configuration) -> PlacementOptions {
        PlacementOptions::new(self.overwrite, config.conflict_policy, self.delete_source)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Load the classification configuration, or the defaults when no path is given.
pub async fn load_configuration(path: Option<&Path>) -> WorkerResult<Configuration> {
    let Some(path) = path else {
        return Ok(Configuration::default());
    };

    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        WorkerError::config_error(format!("cannot read {}: {}", path.display(), e))
    })?;
    let config = Configuration::from_json(&json)?;

    info!(
        path = %path.display(),
        buckets = config.color_ranges.len(),
        "Loaded colour configuration"
    );
    Ok(config)
}

/// Holder of the current classification configuration.
///
/// Readers take an `Arc` snapshot that stays fixed for as long as they hold
/// it; [`ConfigStore::replace`] swaps in a whole new value. A batch that is
/// already running keeps the snapshot it started with.
#[derive(Debug)]
pub struct ConfigStore {
    current: watch::Sender<Arc<Configuration>>,
}

impl ConfigStore {
    /// Create a store holding an already validated configuration.
    pub fn new(config: Configuration) -> WorkerResult<Self> {
        config.validate()?;
        let (current, _) = watch::channel(Arc::new(config));
        Ok(Self { current })
    }

    /// The configuration as of now.
    pub fn snapshot(&self) -> Arc<Configuration> {
        Arc::clone(&self.current.borrow())
    }

    /// Validate and install a new configuration, returning the previous one.
    pub fn replace(&self, config: Configuration) -> WorkerResult<Arc<Configuration>> {
        config.validate()?;
        let previous = self.current.send_replace(Arc::new(config));
        info!("Colour configuration replaced");
        Ok(previous)
    }

    /// Receiver notified whenever the configuration is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Configuration>> {
        self.current.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        let (current, _) = watch::channel(Arc::new(Configuration::default()));
        Self { current }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huesort_models::ConflictPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_placement_options_follow_config() {
        let worker = WorkerConfig {
            overwrite: true,
            ..WorkerConfig::default()
        };
        let config = Configuration::default().with_conflict_policy(ConflictPolicy::Suffix);
        let options = worker.placement_options(&config);
        assert!(options.overwrite);
        assert!(!options.delete_source);
        assert_eq!(options.conflict_policy, ConflictPolicy::Suffix);
    }

    #[tokio::test]
    async fn test_load_configuration_defaults_without_path() {
        let config = load_configuration(None).await.unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[tokio::test]
    async fn test_load_configuration_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("colors.json");
        tokio::fs::write(&path, r#"{"sample_frames": 5, "min_color_percent": 30}"#)
            .await
            .unwrap();

        let config = load_configuration(Some(&path)).await.unwrap();
        assert_eq!(config.sample_frame_count, 5);
        assert_eq!(config.min_color_percent, 30.0);
    }

    #[tokio::test]
    async fn test_load_configuration_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("colors.json");
        tokio::fs::write(&path, r#"{"resize_width": 0}"#).await.unwrap();

        let err = load_configuration(Some(&path)).await.unwrap_err();
        assert!(err.is_configuration());

        let missing = load_configuration(Some(&dir.path().join("nope.json"))).await;
        assert!(missing.is_err());
    }

    #[test]
    fn test_store_swaps_whole_configuration() {
        let store = ConfigStore::default();
        let before = store.snapshot();

        let previous = store
            .replace(Configuration::default().with_sample_frame_count(3))
            .unwrap();

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.sample_frame_count, 10);
        assert_eq!(store.snapshot().sample_frame_count, 3);
    }

    #[test]
    fn test_store_rejects_invalid_replacement() {
        let store = ConfigStore::default();
        assert!(store
            .replace(Configuration::default().with_sample_frame_count(0))
            .is_err());
        assert_eq!(store.snapshot().sample_frame_count, 10);
    }

    #[test]
    fn test_subscribers_see_replacement() {
        let store = ConfigStore::default();
        let mut rx = store.subscribe();

        store
            .replace(Configuration::default().with_min_color_percent(35.0))
            .unwrap();

        tokio_test::block_on(rx.changed()).unwrap();
        assert_eq!(rx.borrow().min_color_percent, 35.0);
    }
}
