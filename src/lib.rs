//! batchscribe - batch transcription of media files into subtitles
//!
//! Queue media, probe durations, optionally cut fixed windows with ffmpeg,
//! transcribe with Whisper or an external command, and write SRT or TXT.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod media;
pub mod pipeline;
pub mod queue;
pub mod stt;
pub mod subtitle;

// Core traits
pub use media::CommandExecutor;
pub use pipeline::{ProgressSink, TranscriptionAdapter};
pub use stt::Transcriber;

// Batch execution
pub use pipeline::{BatchOutcome, BatchReport, BatchSettings, CancelHandle, PipelineController};
pub use queue::{MediaQueue, MediaTask, TaskStatus};

// Error handling
pub use error::{ErrorKind, Result, ScribeError};

// Config
pub use config::{Config, OutputFormat, TranscriptionMode};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
