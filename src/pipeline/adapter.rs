//! Whole-file and chunked transcription of one queued file.

use super::controller::CancelHandle;
use super::merge::TimelineMerger;
use crate::config::TranscriptionMode;
use crate::error::ScribeError;
use crate::media::{ChunkExtractor, plan};
use crate::queue::MediaTask;
use crate::stt::{LanguageHint, Segment, TranscribeOptions, TranscribeRequest, Transcriber};
use std::fmt;

/// Per-task sub-state while a batch is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStage {
    Probing,
    Extracting,
    Transcribing,
    Writing,
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStage::Probing => "probing",
            TaskStage::Extracting => "extracting",
            TaskStage::Transcribing => "transcribing",
            TaskStage::Writing => "writing",
        };
        f.write_str(s)
    }
}

/// A task-scoped failure tagged with the stage it happened in.
#[derive(Debug)]
pub struct TaskFailure {
    pub stage: TaskStage,
    pub error: ScribeError,
}

impl TaskFailure {
    pub fn new(stage: TaskStage, error: ScribeError) -> Self {
        Self { stage, error }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, ScribeError::Cancelled)
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} while {}: {}", self.error.kind(), self.stage, self.error)
    }
}

/// Adapter output for one file, timestamps on the file's own timeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileTranscript {
    /// Engine's full text; only whole-file transcription provides it.
    pub full_text: Option<String>,
    pub segments: Vec<Segment>,
}

pub type TaskResult<T> = std::result::Result<T, TaskFailure>;

/// One interface over the engine, whole-file or chunked.
pub trait TranscriptionAdapter: Send + Sync {
    fn transcribe(
        &self,
        task: &MediaTask,
        engine: &dyn Transcriber,
        cancel: &CancelHandle,
    ) -> TaskResult<FileTranscript>;

    fn mode(&self) -> TranscriptionMode;
}

/// Single engine call over the original file.
#[derive(Debug, Clone)]
pub struct WholeFileAdapter {
    language: LanguageHint,
}

impl WholeFileAdapter {
    pub fn new(language: LanguageHint) -> Self {
        Self { language }
    }
}

impl TranscriptionAdapter for WholeFileAdapter {
    fn transcribe(
        &self,
        task: &MediaTask,
        engine: &dyn Transcriber,
        _cancel: &CancelHandle,
    ) -> TaskResult<FileTranscript> {
        tracing::debug!(file = %task.path.display(), stage = %TaskStage::Transcribing, "transcribing whole file");

        let request = TranscribeRequest::new(&task.path, self.language.clone())
            .with_options(TranscribeOptions::whole_file());
        let transcript = engine
            .transcribe(&request)
            .map_err(|e| TaskFailure::new(TaskStage::Transcribing, e))?;

        let mut segments = transcript.segments;
        segments.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

        Ok(FileTranscript {
            full_text: Some(transcript.full_text),
            segments,
        })
    }

    fn mode(&self) -> TranscriptionMode {
        TranscriptionMode::WholeFile
    }
}

/// One engine call per fixed window, merged back onto the file timeline.
pub struct ChunkedAdapter {
    extractor: ChunkExtractor,
    window_seconds: f64,
    whole_file: WholeFileAdapter,
}

impl ChunkedAdapter {
    pub fn new(extractor: ChunkExtractor, window_seconds: f64, language: LanguageHint) -> Self {
        Self {
            extractor,
            window_seconds,
            whole_file: WholeFileAdapter::new(language),
        }
    }
}

impl TranscriptionAdapter for ChunkedAdapter {
    fn transcribe(
        &self,
        task: &MediaTask,
        engine: &dyn Transcriber,
        cancel: &CancelHandle,
    ) -> TaskResult<FileTranscript> {
        let windows = plan(task.duration_seconds(), self.window_seconds);
        if windows.is_empty() {
            tracing::info!(
                file = %task.path.display(),
                "duration unknown, transcribing as a whole file"
            );
            return self.whole_file.transcribe(task, engine, cancel);
        }

        let window_count = windows.len();
        let mut merger = TimelineMerger::new();

        for window in windows {
            if cancel.is_cancelled() {
                return Err(TaskFailure::new(TaskStage::Extracting, ScribeError::Cancelled));
            }

            tracing::debug!(
                file = %task.path.display(),
                stage = %TaskStage::Extracting,
                window = window.index,
                "window {}/{} at {:.3}s",
                window.index + 1,
                window_count,
                window.start_seconds
            );

            let artifact = self
                .extractor
                .extract(&task.path, window)
                .map_err(|e| TaskFailure::new(TaskStage::Extracting, e))?;

            let request = TranscribeRequest::new(artifact.path(), self.whole_file.language.clone())
                .with_options(TranscribeOptions::chunk());
            let transcript = engine
                .transcribe(&request)
                .map_err(|e| TaskFailure::new(TaskStage::Transcribing, e))?;
            artifact.release();

            merger.push_window(&window, transcript.segments);
        }

        Ok(FileTranscript {
            full_text: None,
            segments: merger.finish(),
        })
    }

    fn mode(&self) -> TranscriptionMode {
        TranscriptionMode::Chunked
    }
}
