//! Batch executor.
//!
//! Clips are handled one after another. Each clip produces exactly one
//! outcome event (`ClipRouted`, `ClipSkipped` or `ClipFailed`) and one
//! [`ClipReport`]; the batch always ends with `BatchCompleted`, including
//! when it was cancelled between clips.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

use huesort_media::{place_file, FrameDecoder, FrameProgress, PlacementOptions, ProgressCallback};
use huesort_models::{
    BatchEvent, BatchId, BatchSummary, ClipFailure, ClipReport, Configuration, PlacementOutcome,
    PlacementResult,
};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::ClipLogger;
use crate::metrics;
use crate::processor::{ClipAnalysis, ClipProcessor};

/// Where and how a batch writes its clips.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Root under which colour folders are created
    pub dest_dir: PathBuf,
    pub placement: PlacementOptions,
}

impl BatchOptions {
    pub fn new(dest_dir: impl Into<PathBuf>, placement: PlacementOptions) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            placement,
        }
    }
}

/// A batch running on its own task.
pub struct BatchHandle {
    pub batch_id: BatchId,
    /// Progress and outcome events, ending with `BatchCompleted`
    pub events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Ask the batch to stop before its next clip. The clip in progress finishes.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// A cloneable handle that can cancel the batch from elsewhere.
    pub fn cancel_sender(&self) -> watch::Sender<bool> {
        self.cancel.clone()
    }

    /// Wait for the batch to finish.
    pub async fn wait(self) -> WorkerResult<BatchSummary> {
        self.task
            .await
            .map_err(|e| WorkerError::batch_failed(e.to_string()))
    }
}

/// Runs batches of clips under one configuration snapshot.
pub struct BatchExecutor {
    processor: ClipProcessor,
}

impl BatchExecutor {
    /// Create an executor for `config`.
    pub fn new(config: Arc<Configuration>, decoder: Arc<dyn FrameDecoder>) -> Self {
        Self {
            processor: ClipProcessor::new(config, decoder),
        }
    }

    pub fn with_processor(processor: ClipProcessor) -> Self {
        Self { processor }
    }

    pub fn config(&self) -> &Configuration {
        self.processor.config()
    }

    /// Run the batch on a new task and hand back its event stream.
    pub fn spawn(self, paths: Vec<PathBuf>, options: BatchOptions) -> BatchHandle {
        let batch_id = BatchId::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let span = tracing::info_span!("batch", batch_id = %batch_id);
        let id = batch_id.clone();
        let task = tokio::spawn(
            async move {
                self.run(id, paths, &options, &events_tx, cancel_rx)
                    .await
            }
            .instrument(span),
        );

        BatchHandle {
            batch_id,
            events: events_rx,
            cancel: cancel_tx,
            task,
        }
    }

    /// Process `paths` in order, sending events as it goes.
    ///
    /// The cancel flag is only read between clips. Send errors are ignored:
    /// a front end that went away does not stop the batch.
    pub async fn process_batch(
        &self,
        paths: Vec<PathBuf>,
        options: &BatchOptions,
        events: &mpsc::UnboundedSender<BatchEvent>,
        cancel: watch::Receiver<bool>,
    ) -> BatchSummary {
        self.run(BatchId::new(), paths, options, events, cancel).await
    }

    async fn run(
        &self,
        batch_id: BatchId,
        paths: Vec<PathBuf>,
        options: &BatchOptions,
        events: &mpsc::UnboundedSender<BatchEvent>,
        cancel: watch::Receiver<bool>,
    ) -> BatchSummary {
        let total = paths.len();
        let mut summary = BatchSummary::new(batch_id.clone(), total);

        info!(
            batch_id = %batch_id,
            total,
            dest = %options.dest_dir.display(),
            "Batch started"
        );
        let _ = events.send(BatchEvent::batch_started(batch_id.clone(), total));

        for (index, path) in paths.into_iter().enumerate() {
            if *cancel.borrow() {
                info!(batch_id = %batch_id, processed = index, total, "Batch cancelled");
                metrics::record_batch_cancelled();
                summary.cancelled = true;
                break;
            }

            let logger = ClipLogger::new(&batch_id, &path);
            let report = self
                .process_one(index, total, path, options, events, &logger)
                .instrument(logger.create_span())
                .await;
            summary.record(report);
        }

        summary.finish();
        info!(batch_id = %batch_id, summary = %summary, "Batch completed");
        let _ = events.send(BatchEvent::BatchCompleted {
            summary: Box::new(summary.clone()),
        });
        summary
    }

    async fn process_one(
        &self,
        index: usize,
        total: usize,
        path: PathBuf,
        options: &BatchOptions,
        events: &mpsc::UnboundedSender<BatchEvent>,
        logger: &ClipLogger,
    ) -> ClipReport {
        let started = Instant::now();
        logger.log_start(index, total);
        let _ = events.send(BatchEvent::ClipStarted {
            index,
            total,
            path: path.clone(),
        });

        let frame_events = events.clone();
        let progress: ProgressCallback = Arc::new(move |p: FrameProgress| {
            let _ = frame_events.send(BatchEvent::FrameProcessed {
                index,
                frames_processed: p.frames_processed,
                frames_planned: p.frames_planned,
            });
        });

        let analysis = self.processor.process_clip(&path, Some(&progress)).await;
        if let Some(failure) = &analysis.failure {
            logger.log_warning(&failure.to_string());
        }

        let dest = options.dest_dir.join(&analysis.folder);
        let placement = place_file(&path, &dest, options.placement).await;

        let report = match placement.outcome {
            PlacementOutcome::Copied => self.routed(index, path, analysis, placement, events, logger),
            PlacementOutcome::SkippedExists => {
                self.skipped(index, path, analysis, placement, events, logger)
            }
            PlacementOutcome::Error => {
                self.failed(index, path, analysis, placement, options, events, logger)
                    .await
            }
        };

        metrics::record_clip_processed(report.outcome(), started.elapsed().as_secs_f64());
        report
    }

    fn routed(
        &self,
        index: usize,
        path: PathBuf,
        analysis: ClipAnalysis,
        placement: PlacementResult,
        events: &mpsc::UnboundedSender<BatchEvent>,
        logger: &ClipLogger,
    ) -> ClipReport {
        let mut failures: Vec<ClipFailure> = analysis.failure.clone().into_iter().collect();
        if let Some(message) = &placement.delete_error {
            logger.log_warning(&format!("source not deleted: {}", message));
            failures.push(ClipFailure::DeleteFailure {
                message: message.clone(),
            });
        }

        logger.log_routed(
            &analysis.folder,
            analysis.dominant_colors.top().map(|top| top.percentage),
        );

        let _ = events.send(BatchEvent::ClipRouted {
            index,
            path: path.clone(),
            colors: analysis.dominant_colors.0.clone(),
            folder: analysis.folder.clone(),
            destination: placement.destination_path.clone().unwrap_or_default(),
            source_deleted: placement.source_deleted,
        });

        report(path, analysis, placement, None, failures)
    }

    fn skipped(
        &self,
        index: usize,
        path: PathBuf,
        analysis: ClipAnalysis,
        placement: PlacementResult,
        events: &mpsc::UnboundedSender<BatchEvent>,
        logger: &ClipLogger,
    ) -> ClipReport {
        let reason = match &placement.destination_path {
            Some(existing) => format!("{} already exists", existing.display()),
            None => "destination already exists".to_string(),
        };
        logger.log_skipped(&reason);

        let _ = events.send(BatchEvent::ClipSkipped {
            index,
            path: path.clone(),
            reason,
        });

        let failures = analysis.failure.clone().into_iter().collect();
        report(path, analysis, placement, None, failures)
    }

    #[allow(clippy::too_many_arguments)]
    async fn failed(
        &self,
        index: usize,
        path: PathBuf,
        analysis: ClipAnalysis,
        placement: PlacementResult,
        options: &BatchOptions,
        events: &mpsc::UnboundedSender<BatchEvent>,
        logger: &ClipLogger,
    ) -> ClipReport {
        let message = placement
            .error
            .clone()
            .unwrap_or_else(|| "copy failed".to_string());
        logger.log_error(&message);

        let mut failures: Vec<ClipFailure> = analysis.failure.clone().into_iter().collect();
        failures.push(ClipFailure::CopyFailure {
            message: message.clone(),
        });

        let fallback = self.fallback_copy(&path, &analysis, options).await;
        let fallback_path = fallback
            .as_ref()
            .filter(|f| f.is_copied())
            .and_then(|f| f.destination_path.clone());

        let _ = events.send(BatchEvent::clip_failed(index, path.clone(), message, fallback_path));

        report(path, analysis, placement, fallback, failures)
    }

    /// Copy a clip that could not be placed into the unidentified folder.
    ///
    /// The source is always kept. Nothing is attempted when the failed copy
    /// already targeted the unidentified folder.
    async fn fallback_copy(
        &self,
        path: &Path,
        analysis: &ClipAnalysis,
        options: &BatchOptions,
    ) -> Option<PlacementResult> {
        let unidentified = &self.config().unidentified_folder;
        if &analysis.folder == unidentified {
            return None;
        }

        let dest = options.dest_dir.join(unidentified);
        let result = place_file(path, &dest, options.placement.keep_source()).await;
        metrics::record_fallback_copy(result.is_copied());
        if !result.is_copied() {
            warn!(
                clip = %path.display(),
                reason = result.error.as_deref().unwrap_or("destination exists"),
                "Fallback copy did not happen"
            );
        }
        Some(result)
    }
}

fn report(
    path: PathBuf,
    analysis: ClipAnalysis,
    placement: PlacementResult,
    fallback: Option<PlacementResult>,
    failures: Vec<ClipFailure>,
) -> ClipReport {
    ClipReport {
        path,
        dominant_colors: analysis.dominant_colors,
        folder: analysis.folder,
        frames_processed: analysis.frames_processed,
        decode_failures: analysis.decode_failures,
        placement,
        fallback,
        failures,
    }
}
