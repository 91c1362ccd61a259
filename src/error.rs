//! Error types for batchscribe.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Engine errors
    #[error("Transcription model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Failed to load transcription engine: {message}")]
    EngineLoad { message: String },

    #[error("Transcription of {source_path} failed: {message}")]
    Transcribe {
        source_path: String,
        message: String,
    },

    // External tool errors
    #[error("External tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Failed to probe duration of {path}: {message}")]
    Probe { path: String, message: String },

    #[error("Failed to extract window {window_index} of {path}: {message}")]
    Extract {
        path: String,
        window_index: usize,
        message: String,
    },

    // Output errors
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to remove temporary file {path}: {message}")]
    Cleanup { path: String, message: String },

    // Queue errors
    #[error("Invalid queue selection: {message}")]
    Range { message: String },

    #[error("Batch cancelled")]
    Cancelled,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used by the controller to decide how far a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    EngineLoad,
    Probe,
    Extract,
    Transcribe,
    Write,
    Cleanup,
    Range,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "ConfigError",
            ErrorKind::EngineLoad => "EngineLoadError",
            ErrorKind::Probe => "ProbeError",
            ErrorKind::Extract => "ExtractError",
            ErrorKind::Transcribe => "TranscribeError",
            ErrorKind::Write => "WriteError",
            ErrorKind::Cleanup => "CleanupWarning",
            ErrorKind::Range => "RangeError",
            ErrorKind::Other => "Error",
        };
        f.write_str(name)
    }
}

impl ScribeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScribeError::ConfigFileNotFound { .. }
            | ScribeError::ConfigParse { .. }
            | ScribeError::ConfigInvalidValue { .. }
            | ScribeError::Config(_) => ErrorKind::Config,
            ScribeError::ModelNotFound { .. } | ScribeError::EngineLoad { .. } => {
                ErrorKind::EngineLoad
            }
            ScribeError::Transcribe { .. } => ErrorKind::Transcribe,
            ScribeError::Probe { .. } => ErrorKind::Probe,
            ScribeError::Extract { .. } => ErrorKind::Extract,
            ScribeError::Write { .. } => ErrorKind::Write,
            ScribeError::Cleanup { .. } => ErrorKind::Cleanup,
            ScribeError::Range { .. } => ErrorKind::Range,
            ScribeError::ToolNotFound { .. }
            | ScribeError::ToolFailed { .. }
            | ScribeError::Cancelled
            | ScribeError::Io(_)
            | ScribeError::Other(_) => ErrorKind::Other,
        }
    }

    /// Only engine-load failures terminate a batch.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::EngineLoad
    }
}

pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = ScribeError::ConfigInvalidValue {
            key: "batch.window_secs".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for batch.window_secs: must be positive"
        );
    }

    #[test]
    fn test_model_not_found_display() {
        let error = ScribeError::ModelNotFound {
            path: "/models/ggml-base.bin".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcription model not found at /models/ggml-base.bin"
        );
    }

    #[test]
    fn test_extract_display_names_window() {
        let error = ScribeError::Extract {
            path: "/media/b.mp4".to_string(),
            window_index: 1,
            message: "ffmpeg exited with status 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to extract window 1 of /media/b.mp4: ffmpeg exited with status 1"
        );
    }

    #[test]
    fn test_transcribe_display() {
        let error = ScribeError::Transcribe {
            source_path: "a.wav".to_string(),
            message: "out of memory".to_string(),
        };
        assert_eq!(error.to_string(), "Transcription of a.wav failed: out of memory");
    }

    #[test]
    fn test_only_engine_load_is_fatal() {
        assert!(
            ScribeError::EngineLoad {
                message: "unsupported device".to_string()
            }
            .is_fatal()
        );
        assert!(
            ScribeError::ModelNotFound {
                path: "x".to_string()
            }
            .is_fatal()
        );
        assert!(
            !ScribeError::Extract {
                path: "x".to_string(),
                window_index: 0,
                message: "boom".to_string()
            }
            .is_fatal()
        );
        assert!(
            !ScribeError::Write {
                path: "x".to_string(),
                message: "disk full".to_string()
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_kind_mapping() {
        let probe = ScribeError::Probe {
            path: "a".to_string(),
            message: "bad json".to_string(),
        };
        assert_eq!(probe.kind(), ErrorKind::Probe);

        let range = ScribeError::Range {
            message: "lo > hi".to_string(),
        };
        assert_eq!(range.kind(), ErrorKind::Range);

        let tool = ScribeError::ToolNotFound {
            tool: "ffmpeg".to_string(),
        };
        assert_eq!(tool.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_kind_display_uses_taxonomy_names() {
        assert_eq!(ErrorKind::Extract.to_string(), "ExtractError");
        assert_eq!(ErrorKind::Cleanup.to_string(), "CleanupWarning");
        assert_eq!(ErrorKind::EngineLoad.to_string(), "EngineLoadError");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: ScribeError = io_error.into();
        assert!(error.to_string().contains("file not found"));

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: ScribeError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ScribeError>();
        assert_sync::<ScribeError>();
    }
}
