//! Chunk extraction into temporary mono 16 kHz WAV artifacts.

use super::chunk::TimeWindow;
use super::command::CommandExecutor;
use crate::defaults::SAMPLE_RATE;
use crate::error::{ErrorKind, Result, ScribeError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide artifact counter; combined with the pid it keeps paths collision-free.
static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A temporary chunk file, deleted when dropped.
#[derive(Debug)]
pub struct ChunkArtifact {
    path: PathBuf,
    window: TimeWindow,
}

impl ChunkArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Delete the artifact now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ChunkArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "removed chunk artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                let warning = ScribeError::Cleanup {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(kind = %ErrorKind::Cleanup, "{}", warning);
            }
        }
    }
}

/// Cuts time windows out of a source file with ffmpeg.
pub struct ChunkExtractor {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    temp_dir: PathBuf,
}

impl ChunkExtractor {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        program: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            program: program.into(),
            temp_dir: temp_dir.into(),
        }
    }

    fn next_artifact_path(&self) -> PathBuf {
        let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
        self.temp_dir
            .join(format!("batchscribe-{}-{}.wav", std::process::id(), seq))
    }

    /// Materialize one window of `source` as a temporary WAV file.
    ///
    /// Any partial output is removed when extraction fails.
    pub fn extract(&self, source: &Path, window: TimeWindow) -> Result<ChunkArtifact> {
        // Guard first so a half-written file is cleaned up on every exit path.
        let artifact = ChunkArtifact {
            path: self.next_artifact_path(),
            window,
        };

        let start = format!("{:.3}", window.start_seconds);
        let length = format!("{:.3}", window.length_seconds);
        let rate = SAMPLE_RATE.to_string();
        let input = source.to_string_lossy();
        let output = artifact.path.to_string_lossy();

        let args = [
            "-y",
            "-ss",
            start.as_str(),
            "-t",
            length.as_str(),
            "-i",
            input.as_ref(),
            "-ac",
            "1",
            "-ar",
            rate.as_str(),
            output.as_ref(),
            "-loglevel",
            "error",
        ];

        tracing::debug!(
            file = %source.display(),
            window = window.index,
            "{} {}",
            self.program,
            args.join(" ")
        );

        let extract_error = |message: String| ScribeError::Extract {
            path: source.display().to_string(),
            window_index: window.index,
            message,
        };

        self.executor
            .execute(&self.program, &args)
            .map_err(|e| extract_error(e.to_string()))?;

        if !artifact.path.is_file() {
            return Err(extract_error(format!(
                "{} produced no output at {}",
                self.program,
                artifact.path.display()
            )));
        }

        Ok(artifact)
    }
}
