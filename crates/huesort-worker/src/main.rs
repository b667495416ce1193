//! Colour routing worker binary.
//!
//! Scans `HUESORT_SOURCE_DIR`, routes every clip into a colour folder under
//! `HUESORT_DEST_DIR` and exits once the batch is done. Ctrl-C stops the
//! batch after the clip in progress.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use huesort_media::{check_ffmpeg, check_ffprobe, FfmpegDecoder};
use huesort_models::BatchEvent;
use huesort_worker::{
    discover_clips, load_configuration, BatchExecutor, BatchOptions, ConfigStore, WorkerConfig,
};

fn use_json_logs() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false)
}

fn init_tracing(use_json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("huesort_worker=info,huesort_media=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn log_event(event: &BatchEvent) {
    match event {
        BatchEvent::FrameProcessed {
            index,
            frames_processed,
            frames_planned,
        } => debug!(index, frames_processed, frames_planned, "Frame processed"),
        BatchEvent::ClipFailed {
            path,
            message,
            fallback,
            ..
        } => warn!(
            clip = %path.display(),
            reason = %message,
            fallback = ?fallback,
            "Clip failed"
        ),
        BatchEvent::BatchCompleted { summary } => info!(%summary, "Batch finished"),
        other => debug!(event = other.event_type().as_str(), "Batch event"),
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let use_json = use_json_logs();
    init_tracing(use_json);

    info!("Starting huesort-worker");

    let worker = WorkerConfig::from_env();
    info!("Worker config: {:?}", worker);

    // Without the tools every clip would land in the unidentified folder
    if let Err(e) = check_ffmpeg().and_then(|_| check_ffprobe()) {
        error!("{}", e);
        std::process::exit(1);
    }

    let config = match load_configuration(worker.config_path.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load colour configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = match ConfigStore::new(config) {
        Ok(store) => store,
        Err(e) => {
            error!("Invalid colour configuration: {}", e);
            std::process::exit(1);
        }
    };
    let snapshot = store.snapshot();

    let exclude = Some(worker.dest_dir.as_path());
    let clips = match discover_clips(&worker.source_dir, &snapshot, exclude).await {
        Ok(clips) => clips,
        Err(e) => {
            error!("Failed to scan source directory: {}", e);
            std::process::exit(1);
        }
    };

    let decoder = Arc::new(FfmpegDecoder::with_timeout(worker.ffmpeg_timeout_secs));
    let options = BatchOptions::new(&worker.dest_dir, worker.placement_options(&snapshot));
    let executor = BatchExecutor::new(Arc::clone(&snapshot), decoder);
    let mut handle = executor.spawn(clips, options);

    // Setup signal handler
    let cancel = handle.cancel_sender();
    let signal_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping after the current clip");
            let _ = cancel.send(true);
        }
    });

    while let Some(event) = handle.events.recv().await {
        log_event(&event);
    }
    signal_handle.abort();

    match handle.wait().await {
        Ok(summary) => {
            if use_json {
                match serde_json::to_string(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => warn!("Could not serialize summary: {}", e),
                }
            } else {
                println!("{}", summary);
                for (folder, count) in &summary.folders {
                    println!("  {:<24} {}", folder, count);
                }
            }
            if summary.errors > 0 {
                std::process::exit(2);
            }
        }
        Err(e) => {
            error!("Batch error: {}", e);
            std::process::exit(1);
        }
    }

    info!("Worker shutdown complete");
}
