use crate::defaults;
use crate::error::{Result, ScribeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub batch: BatchConfig,
    pub tools: ToolsConfig,
}

/// Transcription engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    /// Model name (`base`, `small.en`, ...) or a path to a model file
    pub model: String,
    /// Directory holding `ggml-<name>.bin` model files
    pub model_dir: Option<PathBuf>,
    pub language: String,
    pub threads: Option<usize>,
    pub use_gpu: bool,
    /// Program and leading arguments for the command engine
    pub command: Vec<String>,
}

/// Which engine implementation handles transcription
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    Whisper,
    Command,
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub mode: TranscriptionMode,
    pub window_secs: f64,
    pub format: OutputFormat,
    pub suffix: Option<String>,
    /// Single output directory for the whole batch; absent = beside each source
    pub output_dir: Option<PathBuf>,
    pub status_interval_secs: u64,
    /// Where chunk artifacts are written; absent = system temp dir
    pub temp_dir: Option<PathBuf>,
}

/// Whole-file or fixed-window transcription
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptionMode {
    WholeFile,
    Chunked,
}

/// Subtitle output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Srt,
    Txt,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Srt => "srt",
            OutputFormat::Txt => "txt",
        }
    }
}

/// External media tool locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffprobe: String,
    pub ffmpeg: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Whisper,
            model: defaults::DEFAULT_MODEL.to_string(),
            model_dir: None,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
            use_gpu: true,
            command: Vec::new(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: TranscriptionMode::Chunked,
            window_secs: defaults::WINDOW_SECS,
            format: OutputFormat::Srt,
            suffix: None,
            output_dir: None,
            status_interval_secs: defaults::STATUS_INTERVAL_SECS,
            temp_dir: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffprobe: defaults::FFPROBE.to_string(),
            ffmpeg: defaults::FFMPEG.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScribeError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ScribeError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file doesn't exist.
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(ScribeError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - BATCHSCRIBE_MODEL → engine.model
    /// - BATCHSCRIBE_MODEL_DIR → engine.model_dir
    /// - BATCHSCRIBE_LANGUAGE → engine.language
    /// - BATCHSCRIBE_FFPROBE → tools.ffprobe
    /// - BATCHSCRIBE_FFMPEG → tools.ffmpeg
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(model) = non_empty_env("BATCHSCRIBE_MODEL") {
            self.engine.model = model;
        }

        if let Some(dir) = non_empty_env("BATCHSCRIBE_MODEL_DIR") {
            self.engine.model_dir = Some(PathBuf::from(dir));
        }

        if let Some(language) = non_empty_env("BATCHSCRIBE_LANGUAGE") {
            self.engine.language = language;
        }

        if let Some(ffprobe) = non_empty_env("BATCHSCRIBE_FFPROBE") {
            self.tools.ffprobe = ffprobe;
        }

        if let Some(ffmpeg) = non_empty_env("BATCHSCRIBE_FFMPEG") {
            self.tools.ffmpeg = ffmpeg;
        }

        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.batch.window_secs.is_finite() && self.batch.window_secs > 0.0) {
            return Err(ScribeError::ConfigInvalidValue {
                key: "batch.window_secs".to_string(),
                message: format!("must be a positive number, got {}", self.batch.window_secs),
            });
        }

        if self.batch.status_interval_secs == 0 {
            return Err(ScribeError::ConfigInvalidValue {
                key: "batch.status_interval_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.engine.kind == EngineKind::Command && self.engine.command.is_empty() {
            return Err(ScribeError::ConfigInvalidValue {
                key: "engine.command".to_string(),
                message: "the command engine needs a program to run".to_string(),
            });
        }

        Ok(())
    }

    /// Render the configuration as a TOML document.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ScribeError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/batchscribe/config.toml on Linux, or a relative
    /// `batchscribe/config.toml` when no config directory is known.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("batchscribe")
            .join("config.toml")
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
