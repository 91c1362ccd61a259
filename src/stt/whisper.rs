//! Whisper-based speech-to-text transcription.
//!
//! This module provides a Whisper implementation of the Transcriber trait using whisper-rs.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature to be enabled and cmake to be installed.
//! To build with Whisper support:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::defaults;
use crate::error::{Result, ScribeError};
use crate::stt::transcriber::{Transcriber, TranscribeRequest, Transcript};
use std::path::{Path, PathBuf};

#[cfg(feature = "whisper")]
use crate::stt::audio;
#[cfg(feature = "whisper")]
use crate::stt::transcriber::Segment;
#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for Whisper transcriber.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
    pub use_gpu: bool,
    /// Decoder used for sources that are not WAV files
    pub ffmpeg: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.bin"),
            threads: None,
            use_gpu: true,
            ffmpeg: defaults::FFMPEG.to_string(),
        }
    }
}

#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
fn model_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.strip_prefix("ggml-").unwrap_or(s))
        .unwrap_or("unknown")
        .to_string()
}

fn check_model_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(ScribeError::ModelNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Whisper-based transcriber implementation.
///
/// The WhisperContext is wrapped in a Mutex to ensure thread safety.
#[cfg(feature = "whisper")]
pub struct WhisperTranscriber {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper-based transcriber placeholder (without whisper feature).
///
/// Construction always fails, so a batch configured for Whisper aborts at
/// engine load instead of failing every file.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperTranscriber {
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl WhisperTranscriber {
    /// Load a Whisper model.
    ///
    /// # Errors
    /// Returns `ScribeError::ModelNotFound` if the model file doesn't exist
    /// Returns `ScribeError::EngineLoad` if model loading fails
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        check_model_exists(&config.model_path)?;
        let model_name = model_name_from_path(&config.model_path);

        tracing::info!(
            model = %model_name,
            backend = defaults::gpu_backend(),
            "loading whisper model"
        );

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu(config.use_gpu);
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| ScribeError::EngineLoad {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| ScribeError::EngineLoad {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperTranscriber {
    /// Always fails: this build has no speech recognition compiled in.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        check_model_exists(&config.model_path)?;
        Err(ScribeError::EngineLoad {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release --features whisper\n",
                "Or set engine.kind = \"command\" to use an external transcriber"
            )
            .to_string(),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(feature = "whisper")]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, request: &TranscribeRequest) -> Result<Transcript> {
        let source_path = request.source.display().to_string();
        let inference_error = |message: String| ScribeError::Transcribe {
            source_path: source_path.clone(),
            message,
        };

        let samples = audio::load_pcm(&request.source, &self.config.ffmpeg)?;
        let audio_f32 = audio::to_f32(&samples);

        // Lock the context for thread-safe access
        let context = self
            .context
            .lock()
            .map_err(|e| inference_error(format!("Failed to acquire context lock: {}", e)))?;

        let mut state = context
            .create_state()
            .map_err(|e| inference_error(format!("Failed to create Whisper state: {}", e)))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(request.language.as_code());
        params.set_no_context(!request.options.condition_on_previous);
        params.set_token_timestamps(request.options.word_timestamps);

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio_f32)
            .map_err(|e| inference_error(format!("Whisper inference failed: {}", e)))?;

        let lang_id = state.full_lang_id_from_state();
        let language = whisper_rs::get_lang_str(lang_id).map(|s| s.to_string());

        // Segment timestamps are in centiseconds.
        let segments: Vec<Segment> = state
            .as_iter()
            .map(|segment| {
                Segment::new(
                    segment.start_timestamp() as f64 / 100.0,
                    segment.end_timestamp() as f64 / 100.0,
                    segment.to_string().trim(),
                )
            })
            .collect();

        let mut transcript = Transcript::from_segments(segments);
        transcript.language = language;
        Ok(transcript)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, request: &TranscribeRequest) -> Result<Transcript> {
        Err(ScribeError::Transcribe {
            source_path: request.source.display().to_string(),
            message: "Whisper feature not enabled".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}
