//! Placing clips into their destination folders.
//!
//! Copies go to a `.part` sibling first and are renamed into place, so a
//! destination folder never shows a half-written clip under its final name.

use huesort_models::{ConflictPolicy, PlacementResult};
use std::fs::FileTimes;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// How [`place_file`] treats existing files and the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementOptions {
    /// Replace an existing file of the same name
    pub overwrite: bool,
    /// What to do about an existing file when `overwrite` is off
    pub conflict_policy: ConflictPolicy,
    /// Remove the source after a successful copy
    pub delete_source: bool,
}

impl PlacementOptions {
    pub fn new(overwrite: bool, conflict_policy: ConflictPolicy, delete_source: bool) -> Self {
        Self {
            overwrite,
            conflict_policy,
            delete_source,
        }
    }

    /// Same options with source deletion turned off.
    pub fn keep_source(self) -> Self {
        Self {
            delete_source: false,
            ..self
        }
    }
}

/// First `stem(n).ext` in `dir` that does not exist yet, counting from 1.
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let ext = name.extension().map(|e| e.to_string_lossy().into_owned());

    let mut n: u32 = 1;
    loop {
        let candidate = match &ext {
            Some(ext) => dir.join(format!("{}({}).{}", stem, n, ext)),
            None => dir.join(format!("{}({})", stem, n)),
        };
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Copy `src` into `dest_dir`, creating the directory chain as needed.
///
/// Never fails: errors come back as a [`PlacementResult`] with the `Error`
/// outcome. A failed source deletion leaves the copy in place and is only
/// reported through `delete_error`.
pub async fn place_file(src: &Path, dest_dir: &Path, options: PlacementOptions) -> PlacementResult {
    let target = match prepare_target(src, dest_dir, options).await {
        Ok(Target::Write(target)) => target,
        Ok(Target::Skip(existing)) => {
            tracing::debug!(
                clip = %src.display(),
                existing = %existing.display(),
                "Destination already exists, skipping"
            );
            return PlacementResult::skipped(existing);
        }
        Err(e) => return PlacementResult::failed(e.to_string()),
    };

    if let Err(e) = copy_preserving_times(src, &target).await {
        tracing::error!(
            clip = %src.display(),
            destination = %target.display(),
            error = %e,
            "Failed to copy clip"
        );
        return PlacementResult::failed(e.to_string());
    }

    let mut result = PlacementResult::copied(target);

    if options.delete_source {
        match fs::remove_file(src).await {
            Ok(()) => result.source_deleted = true,
            Err(e) => {
                tracing::warn!(
                    clip = %src.display(),
                    error = %e,
                    "Copied clip but could not remove the source"
                );
                result.delete_error = Some(e.to_string());
            }
        }
    }

    result
}

enum Target {
    Write(PathBuf),
    Skip(PathBuf),
}

async fn prepare_target(src: &Path, dest_dir: &Path, options: PlacementOptions) -> MediaResult<Target> {
    let file_name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MediaError::internal(format!("{} has no file name", src.display())))?;

    if !fs::try_exists(src).await? {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }

    fs::create_dir_all(dest_dir).await?;

    let target = dest_dir.join(&file_name);
    if !fs::try_exists(&target).await? {
        return Ok(Target::Write(target));
    }

    // Re-placing a clip that already sits in its folder must not clobber it
    if fs::canonicalize(src).await? == fs::canonicalize(&target).await? {
        return Ok(Target::Skip(target));
    }

    if options.overwrite {
        fs::remove_file(&target).await?;
        return Ok(Target::Write(target));
    }

    match options.conflict_policy {
        ConflictPolicy::Skip => Ok(Target::Skip(target)),
        ConflictPolicy::Suffix => Ok(Target::Write(unique_destination(dest_dir, &file_name))),
    }
}

/// Sibling the copy is written to before the final rename.
fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

async fn copy_preserving_times(src: &Path, target: &Path) -> MediaResult<()> {
    let partial = partial_path(target);

    let copied = async {
        fs::copy(src, &partial).await?;

        let meta = fs::metadata(src).await?;
        let mut times = FileTimes::new();
        if let Ok(accessed) = meta.accessed() {
            times = times.set_accessed(accessed);
        }
        if let Ok(modified) = meta.modified() {
            times = times.set_modified(modified);
        }
        let file = fs::OpenOptions::new().write(true).open(&partial).await?;
        file.into_std().await.set_times(times)?;

        fs::rename(&partial, target).await?;
        Ok::<(), MediaError>(())
    }
    .await;

    if copied.is_err() {
        let _ = fs::remove_file(&partial).await;
    }
    copied
}
