//! Speech-to-text engines behind the [`Transcriber`] trait.

pub mod audio;
pub mod command;
pub mod models;
pub mod transcriber;
pub mod whisper;

pub use command::CommandTranscriber;
pub use transcriber::{
    LanguageHint, MockCall, MockTranscriber, Segment, TranscribeOptions, TranscribeRequest,
    Transcriber, Transcript, WordTiming,
};
pub use whisper::{WhisperConfig, WhisperTranscriber};

use crate::config::{EngineConfig, EngineKind, ToolsConfig};
use crate::error::Result;
use crate::media::SystemCommandExecutor;
use std::sync::Arc;

/// Construct the configured engine.
///
/// Every error returned here is an engine-load failure and aborts the batch.
pub fn load_engine(engine: &EngineConfig, tools: &ToolsConfig) -> Result<Arc<dyn Transcriber>> {
    match engine.kind {
        EngineKind::Whisper => {
            let model_path = models::resolve_model_path(&engine.model, engine.model_dir.as_deref())?;
            let transcriber = WhisperTranscriber::new(WhisperConfig {
                model_path,
                threads: engine.threads,
                use_gpu: engine.use_gpu,
                ffmpeg: tools.ffmpeg.clone(),
            })?;
            Ok(Arc::new(transcriber))
        }
        EngineKind::Command => {
            let transcriber =
                CommandTranscriber::new(Arc::new(SystemCommandExecutor::new()), &engine.command)?;
            Ok(Arc::new(transcriber))
        }
    }
}
