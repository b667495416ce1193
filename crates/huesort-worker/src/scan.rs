//! Clip discovery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use huesort_models::Configuration;

use crate::error::{WorkerError, WorkerResult};

/// Every file under `root`, depth first.
///
/// Within a directory, files come before subdirectories and both are visited
/// in file-name order. The directory `exclude` resolves to is not entered,
/// so a destination nested inside the source is never rescanned, however
/// either path was spelled.
async fn walk_files(root: &Path, exclude: Option<&Path>) -> WorkerResult<Vec<PathBuf>> {
    // A destination that does not exist yet cannot hold anything to skip
    let exclude = match exclude {
        Some(path) => fs::canonicalize(path).await.ok(),
        None => None,
    };

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        let mut here_files = Vec::new();
        let mut here_dirs = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                if is_excluded(&path, exclude.as_deref()).await {
                    debug!(path = %path.display(), "Skipping excluded directory");
                    continue;
                }
                here_dirs.push(path);
            } else if file_type.is_file() || fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                here_files.push(path);
            }
        }

        here_files.sort();
        here_dirs.sort();
        files.extend(here_files);
        // Stack: push in reverse so the first directory is visited next
        pending.extend(here_dirs.into_iter().rev());
    }

    Ok(files)
}

async fn is_excluded(dir: &Path, exclude: Option<&Path>) -> bool {
    match exclude {
        Some(exclude) => fs::canonicalize(dir).await.is_ok_and(|c| c == exclude),
        None => false,
    }
}

/// Find the clips to process under `source_dir`.
///
/// One pass per configured extension, in configured order; a file matching
/// several spellings of the same extension is listed once.
pub async fn discover_clips(
    source_dir: &Path,
    config: &Configuration,
    exclude: Option<&Path>,
) -> WorkerResult<Vec<PathBuf>> {
    if !fs::try_exists(source_dir).await? {
        return Err(WorkerError::SourceNotFound(source_dir.to_path_buf()));
    }

    let files = walk_files(source_dir, exclude).await?;
    let mut seen = HashSet::new();
    let mut clips = Vec::new();

    for ext in &config.supported_extensions {
        let ext = ext.trim().trim_start_matches('.');
        for file in &files {
            let matches = file
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext));
            if matches && seen.insert(file.clone()) {
                clips.push(file.clone());
            }
        }
    }

    info!(
        source = %source_dir.display(),
        files = files.len(),
        clips = clips.len(),
        "Discovered clips"
    );
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn touch(path: PathBuf) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.unwrap();
        }
        fs::write(&path, b"").await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_discovers_by_extension_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let b_mov = touch(root.join("b.mov")).await;
        let a_mp4 = touch(root.join("a.mp4")).await;
        let nested = touch(root.join("sub").join("c.MP4")).await;
        touch(root.join("notes.txt")).await;

        let clips = discover_clips(root, &Configuration::default(), None).await.unwrap();

        assert_eq!(clips, vec![a_mp4, nested, b_mov]);
    }

    #[tokio::test]
    async fn test_excluded_destination_is_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let clip = touch(root.join("bg.mp4")).await;
        touch(root.join("sorted").join("red").join("bg.mp4")).await;

        let clips = discover_clips(root, &Configuration::default(), Some(&root.join("sorted")))
            .await
            .unwrap();

        assert_eq!(clips, vec![clip]);
    }

    #[tokio::test]
    async fn test_excluded_destination_matches_any_spelling() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let clip = touch(root.join("bg.mp4")).await;
        touch(root.join("sorted").join("red").join("bg.mp4")).await;

        // Same directory reached through a different path
        let roundabout = root.join("sorted").join("red").join("..");
        let clips = discover_clips(root, &Configuration::default(), Some(&roundabout))
            .await
            .unwrap();
        assert_eq!(clips, vec![clip]);
    }

    #[tokio::test]
    async fn test_missing_exclude_is_ignored() {
        let dir = TempDir::new().unwrap();
        let clip = touch(dir.path().join("bg.mp4")).await;
        let clips = discover_clips(
            dir.path(),
            &Configuration::default(),
            Some(&dir.path().join("not-created-yet")),
        )
        .await
        .unwrap();
        assert_eq!(clips, vec![clip]);
    }

    #[tokio::test]
    async fn test_duplicate_extension_spellings() {
        let dir = TempDir::new().unwrap();
        let clip = touch(dir.path().join("x.avi")).await;
        let mut config = Configuration::default();
        config.supported_extensions = vec![".avi".into(), "AVI".into()];

        let clips = discover_clips(dir.path(), &config, None).await.unwrap();
        assert_eq!(clips, vec![clip]);
    }

    #[tokio::test]
    async fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = discover_clips(&dir.path().join("nope"), &Configuration::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::SourceNotFound(_)));
    }
}
