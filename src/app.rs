//! Batch application entry point.
//!
//! Builds the queue from command-line inputs, runs the controller on a
//! blocking worker, and turns Ctrl+C into a cooperative cancel.

use crate::config::Config;
use crate::error::{Result, ScribeError};
use crate::media::{CommandExecutor, DurationProbe, SystemCommandExecutor};
use crate::pipeline::{BatchReport, BatchSettings, LogSink, PipelineController};
use crate::queue::MediaQueue;
use crate::stt::load_engine;
use crate::stt::models::{default_models_dir, list_local_models};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fill a queue from files and directories.
///
/// Directories are scanned recursively for supported media. Files are taken
/// as given even when the extension is unknown; a missing file is queued
/// with a warning and will fail or fall back at probe time.
pub fn build_queue(inputs: &[PathBuf]) -> Result<MediaQueue> {
    let mut queue = MediaQueue::new();
    for input in inputs {
        if input.is_dir() {
            let added = queue.append_dir(input)?;
            tracing::debug!(dir = %input.display(), added, "Scanned directory");
        } else {
            if !input.exists() {
                tracing::warn!(file = %input.display(), "Input does not exist");
            }
            queue.append([input.clone()]);
        }
    }
    Ok(queue)
}

/// Run `batchscribe run`: transcribe every input and return the batch report.
///
/// Ctrl+C requests cancellation; the current chunk or file finishes first.
pub async fn run_batch_command(config: Config, inputs: Vec<PathBuf>) -> Result<BatchReport> {
    config.validate()?;

    let queue = build_queue(&inputs)?;
    if queue.is_empty() {
        return Err(ScribeError::Other(
            "No media files found in the given inputs".to_string(),
        ));
    }
    tracing::info!(files = queue.len(), "Queued media files");

    let executor: Arc<dyn CommandExecutor> = Arc::new(SystemCommandExecutor::new());
    let mut controller = PipelineController::new(BatchSettings::from_config(&config), executor);
    *controller.queue_mut() = queue;
    let cancel = controller.cancel_handle();

    let engine = config.engine.clone();
    let tools = config.tools.clone();
    let mut worker = tokio::task::spawn_blocking(move || {
        controller.run(|| load_engine(&engine, &tools), Box::new(LogSink))
    });

    let joined = tokio::select! {
        joined = &mut worker => joined,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::warn!("Cancel requested, stopping after the current step");
            }
            cancel.cancel();
            worker.await
        }
    };

    joined.map_err(|e| ScribeError::Other(format!("Batch worker failed: {}", e)))
}

/// Probe each file's duration. Failures are returned per file.
pub fn probe_files(config: &Config, files: &[PathBuf]) -> Vec<(PathBuf, Result<f64>)> {
    let probe = DurationProbe::new(
        Arc::new(SystemCommandExecutor::new()),
        config.tools.ffprobe.clone(),
    );
    files
        .iter()
        .map(|file| (file.clone(), probe.try_probe(file)))
        .collect()
}

/// Directory scanned for local models: explicit flag, then config, then the cache dir.
pub fn models_dir(config: &Config, dir: Option<&Path>) -> PathBuf {
    dir.map(Path::to_path_buf)
        .or_else(|| config.engine.model_dir.clone())
        .unwrap_or_else(default_models_dir)
}

/// Installed model names in the resolved models directory.
pub fn installed_models(config: &Config, dir: Option<&Path>) -> (PathBuf, Vec<String>) {
    let dir = models_dir(config, dir);
    let models = list_local_models(&dir);
    (dir, models)
}
