use std::io::Write;
use std::path::Path;

use huesort_media::{check_ffmpeg, check_ffprobe};
use huesort_worker::{load_configuration, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "worker-selfcheck: starting with source_dir={} dest_dir={}",
        config.source_dir.display(),
        config.dest_dir.display()
    );
    ensure_tools()?;
    ensure_dir_readable(&config.source_dir).await?;
    ensure_dest_writable(&config.dest_dir).await?;
    ensure_configuration(config.config_path.as_deref()).await?;

    println!("worker-selfcheck: ok");
    Ok(())
}

fn ensure_tools() -> anyhow::Result<()> {
    let ffmpeg = check_ffmpeg().map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;
    let ffprobe = check_ffprobe().map_err(|e| anyhow::anyhow!("ffprobe not available: {}", e))?;
    println!(
        "worker-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );
    Ok(())
}

async fn ensure_dir_readable(path: &Path) -> anyhow::Result<()> {
    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot open source dir {}: {}", path.display(), e))?;
    // Listing can still fail on a directory that opened fine
    let first = entries
        .next_entry()
        .await
        .map_err(|e| anyhow::anyhow!("cannot list source dir {}: {}", path.display(), e))?;
    if first.is_none() {
        println!("worker-selfcheck: source dir {} is empty", path.display());
    }
    Ok(())
}

async fn ensure_dest_writable(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    let mut scratch = tempfile::NamedTempFile::new_in(path)
        .map_err(|e| anyhow::anyhow!("dest dir {} is not writable: {}", path.display(), e))?;
    scratch.write_all(b"huesort")?;
    Ok(())
}

async fn ensure_configuration(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_configuration(path).await?;
    println!(
        "worker-selfcheck: {} colour buckets, {} frames per clip",
        config.color_ranges.iter().filter(|c| c.enabled).count(),
        config.sample_frame_count
    );
    Ok(())
}
