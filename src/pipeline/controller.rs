//! Sequential batch execution over the media queue.

use super::adapter::{
    ChunkedAdapter, TaskFailure, TaskResult, TaskStage, TranscriptionAdapter, WholeFileAdapter,
};
use super::eta::{EtaEstimator, ThroughputSample, format_hms};
use super::reporter::{ProgressEvent, ProgressSink, StatusReporter};
use crate::config::{Config, OutputFormat, TranscriptionMode};
use crate::error::{Result, ScribeError};
use crate::media::{ChunkExtractor, CommandExecutor, DurationProbe};
use crate::queue::{MediaQueue, TaskStatus};
use crate::stt::{LanguageHint, Transcriber};
use crate::subtitle::{OutputTarget, output_path, write_subtitle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared flag asking a running batch to stop at the next task or chunk boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Everything a batch needs besides the queue and the engine.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub mode: TranscriptionMode,
    pub window_seconds: f64,
    pub format: OutputFormat,
    pub suffix: Option<String>,
    pub target: OutputTarget,
    pub language: LanguageHint,
    pub status_interval: Duration,
    pub temp_dir: PathBuf,
    pub ffprobe: String,
    pub ffmpeg: String,
}

impl BatchSettings {
    pub fn from_config(config: &Config) -> Self {
        let batch = &config.batch;
        Self {
            mode: batch.mode,
            window_seconds: batch.window_secs,
            format: batch.format,
            suffix: batch.suffix.clone(),
            target: batch
                .output_dir
                .clone()
                .map(OutputTarget::Directory)
                .unwrap_or_default(),
            language: LanguageHint::parse(&config.engine.language),
            status_interval: Duration::from_secs(batch.status_interval_secs.max(1)),
            temp_dir: batch.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
            ffprobe: config.tools.ffprobe.clone(),
            ffmpeg: config.tools.ffmpeg.clone(),
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Batch lifecycle. Per-file stages are reported on failures and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    NotStarted,
    LoadingEngine,
    Running,
    Finished,
}

/// How a batch ended.
#[derive(Debug)]
pub enum BatchOutcome {
    Completed,
    Cancelled,
    /// The engine could not be loaded; no file was processed.
    Aborted(ScribeError),
}

/// Per-file result of a batch.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: TaskStatus,
    pub output_path: Option<PathBuf>,
    pub failed_stage: Option<TaskStage>,
    pub error: Option<ScribeError>,
    pub elapsed_seconds: f64,
    pub media_seconds: f64,
}

#[derive(Debug)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub files: Vec<FileReport>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn count(&self, status: TaskStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Aborted(_))
    }
}

/// Owns the queue and runs batches over it, one file at a time.
pub struct PipelineController {
    queue: MediaQueue,
    settings: BatchSettings,
    probe: DurationProbe,
    adapter: Box<dyn TranscriptionAdapter>,
    cancel: CancelHandle,
    phase: BatchPhase,
}

impl PipelineController {
    pub fn new(settings: BatchSettings, executor: Arc<dyn CommandExecutor>) -> Self {
        let probe = DurationProbe::new(executor.clone(), settings.ffprobe.clone());
        let adapter: Box<dyn TranscriptionAdapter> = match settings.mode {
            TranscriptionMode::WholeFile => {
                Box::new(WholeFileAdapter::new(settings.language.clone()))
            }
            TranscriptionMode::Chunked => Box::new(ChunkedAdapter::new(
                ChunkExtractor::new(executor, settings.ffmpeg.clone(), settings.temp_dir.clone()),
                settings.window_seconds,
                settings.language.clone(),
            )),
        };

        Self {
            queue: MediaQueue::new(),
            settings,
            probe,
            adapter,
            cancel: CancelHandle::new(),
            phase: BatchPhase::NotStarted,
        }
    }

    pub fn queue(&self) -> &MediaQueue {
        &self.queue
    }

    /// Queue edits need exclusive access, so they cannot race a running batch.
    pub fn queue_mut(&mut self) -> &mut MediaQueue {
        &mut self.queue
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    fn set_phase(&mut self, phase: BatchPhase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "batch phase");
        self.phase = phase;
    }

    /// Probe a task once; later calls reuse the cached duration.
    fn probed_duration(&mut self, index: usize) -> f64 {
        let Some(task) = self.queue.get(index) else {
            return 0.0;
        };
        if task.is_probed() {
            return task.duration_seconds();
        }
        let duration = self.probe.probe(&task.path);
        if let Some(task) = self.queue.tasks_mut().get_mut(index) {
            task.duration = Some(duration);
        }
        duration
    }

    /// Run one batch over the whole queue.
    ///
    /// `load_engine` runs after the status reporter has started; its failure
    /// aborts the batch before any file is touched. The reporter is always
    /// stopped before this returns.
    pub fn run<F>(&mut self, load_engine: F, sink: Box<dyn ProgressSink>) -> BatchReport
    where
        F: FnOnce() -> Result<Arc<dyn Transcriber>>,
    {
        let started = Instant::now();
        self.cancel.reset();
        for task in self.queue.tasks_mut() {
            task.status = TaskStatus::Pending;
            task.elapsed_seconds = 0.0;
        }

        let total = self.queue.len();
        let mut files: Vec<FileReport> = self
            .queue
            .tasks()
            .iter()
            .map(|task| FileReport {
                path: task.path.clone(),
                status: TaskStatus::Pending,
                output_path: None,
                failed_stage: None,
                error: None,
                elapsed_seconds: 0.0,
                media_seconds: 0.0,
            })
            .collect();

        let mut reporter = StatusReporter::new(self.settings.status_interval);
        if let Err(e) = reporter.start(
            sink,
            ProgressEvent {
                processed: 0,
                total,
                in_progress: false,
            },
        ) {
            tracing::warn!("status reporter unavailable: {}", e);
        }

        tracing::info!(files = total, mode = ?self.settings.mode, "starting batch");
        self.set_phase(BatchPhase::LoadingEngine);

        let outcome = match load_engine() {
            Ok(engine) => {
                tracing::info!(model = engine.model_name(), "transcription engine loaded");
                self.set_phase(BatchPhase::Running);
                self.process_queue(engine.as_ref(), &reporter, &mut files)
            }
            Err(e) => {
                tracing::error!(kind = %e.kind(), "{}", e);
                BatchOutcome::Aborted(e)
            }
        };

        reporter.stop();
        self.set_phase(BatchPhase::Finished);

        let elapsed = started.elapsed();
        tracing::info!(
            done = files.iter().filter(|f| f.status == TaskStatus::Done).count(),
            failed = files.iter().filter(|f| f.status == TaskStatus::Failed).count(),
            "batch finished, total time {}",
            format_hms(elapsed.as_secs_f64())
        );

        BatchReport {
            outcome,
            files,
            elapsed,
        }
    }

    fn process_queue(
        &mut self,
        engine: &dyn Transcriber,
        reporter: &StatusReporter,
        files: &mut [FileReport],
    ) -> BatchOutcome {
        let total = self.queue.len();
        let mut eta = EtaEstimator::new();
        let mut processed = 0;

        for index in 0..total {
            if self.cancel.is_cancelled() {
                tracing::info!(pending = total - index, "batch cancelled");
                return BatchOutcome::Cancelled;
            }

            reporter.publish(ProgressEvent {
                processed,
                total,
                in_progress: true,
            });

            let task_started = Instant::now();
            if let Some(task) = self.queue.tasks_mut().get_mut(index) {
                task.status = TaskStatus::Running;
            }
            let result = self.process_task(index, engine);
            let elapsed_seconds = task_started.elapsed().as_secs_f64();
            let media_seconds = self.queue.get(index).map_or(0.0, |t| t.duration_seconds());

            let status = match result {
                Ok(output) => {
                    tracing::info!(
                        file = %output.display(),
                        "finished {} in {} (media {})",
                        files[index].path.display(),
                        format_hms(elapsed_seconds),
                        format_hms(media_seconds)
                    );
                    eta.update(ThroughputSample {
                        wall_seconds: elapsed_seconds,
                        media_seconds,
                    });
                    files[index].output_path = Some(output);
                    TaskStatus::Done
                }
                Err(failure) if failure.is_cancelled() => {
                    tracing::info!(
                        file = %files[index].path.display(),
                        pending = total - index,
                        "batch cancelled"
                    );
                    if let Some(task) = self.queue.tasks_mut().get_mut(index) {
                        task.status = TaskStatus::Pending;
                    }
                    return BatchOutcome::Cancelled;
                }
                Err(failure) => {
                    tracing::error!(
                        file = %files[index].path.display(),
                        stage = %failure.stage,
                        kind = %failure.error.kind(),
                        "{}",
                        failure.error
                    );
                    files[index].failed_stage = Some(failure.stage);
                    files[index].error = Some(failure.error);
                    TaskStatus::Failed
                }
            };

            if let Some(task) = self.queue.tasks_mut().get_mut(index) {
                task.status = status;
                task.elapsed_seconds = elapsed_seconds;
            }
            files[index].status = status;
            files[index].elapsed_seconds = elapsed_seconds;
            files[index].media_seconds = media_seconds;
            processed += 1;

            reporter.publish(ProgressEvent {
                processed,
                total,
                in_progress: false,
            });

            if status == TaskStatus::Done {
                self.log_eta(&eta, index + 1);
            }
        }

        BatchOutcome::Completed
    }

    fn process_task(&mut self, index: usize, engine: &dyn Transcriber) -> TaskResult<PathBuf> {
        self.probed_duration(index);

        let Some(task) = self.queue.get(index).cloned() else {
            return Err(TaskFailure::new(
                TaskStage::Probing,
                ScribeError::Other(format!("no queued task at index {}", index)),
            ));
        };

        let output = output_path(
            &task.path,
            &self.settings.target,
            self.settings.suffix.as_deref(),
            self.settings.format,
        );
        tracing::info!(file = %task.path.display(), output = %output.display(), "processing {}", task.display_name);

        let transcript = self.adapter.transcribe(&task, engine, &self.cancel)?;

        write_subtitle(
            &output,
            self.settings.format,
            transcript.full_text.as_deref(),
            &transcript.segments,
        )
        .map_err(|e| TaskFailure::new(TaskStage::Writing, e))?;

        Ok(output)
    }

    /// Log the projected remaining time once the estimator has enough data.
    fn log_eta(&mut self, eta: &EtaEstimator, next_index: usize) {
        if eta.rate().is_none() {
            return;
        }

        let remaining_media: f64 = (next_index..self.queue.len())
            .map(|i| self.probed_duration(i))
            .sum();
        if remaining_media <= 0.0 {
            return;
        }

        if let Some(estimate) = eta.estimate(remaining_media) {
            let rounded = Duration::from_secs(estimate.as_secs());
            tracing::info!(
                remaining_media = %format_hms(remaining_media),
                "estimated time remaining: {}",
                humantime::format_duration(rounded)
            );
        }
    }
}
