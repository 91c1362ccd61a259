//! Media duration probing through `ffprobe`.

use super::command::CommandExecutor;
use crate::error::{Result, ScribeError};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Queries total media duration with
/// `ffprobe -v error -show_entries format=duration -of json <path>`.
pub struct DurationProbe {
    executor: Arc<dyn CommandExecutor>,
    program: String,
}

impl DurationProbe {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }

    /// Probe a file, surfacing the reason on failure.
    pub fn try_probe(&self, path: &Path) -> Result<f64> {
        let path_arg = path.to_string_lossy();
        let args = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
            path_arg.as_ref(),
        ];

        tracing::debug!(file = %path.display(), "probing duration");

        let stdout = self
            .executor
            .execute(&self.program, &args)
            .map_err(|e| probe_error(path, e.to_string()))?;

        parse_duration(&stdout).map_err(|message| probe_error(path, message))
    }

    /// Probe a file, returning 0 when the duration cannot be determined.
    ///
    /// Callers treat 0 as "unknown".
    pub fn probe(&self, path: &Path) -> f64 {
        match self.try_probe(path) {
            Ok(seconds) => seconds,
            Err(e) => {
                tracing::warn!(file = %path.display(), kind = %e.kind(), "{}", e);
                0.0
            }
        }
    }
}

fn probe_error(path: &Path, message: String) -> ScribeError {
    ScribeError::Probe {
        path: path.display().to_string(),
        message,
    }
}

/// Extract `format.duration` from ffprobe's JSON output.
fn parse_duration(stdout: &str) -> std::result::Result<f64, String> {
    let output: ProbeOutput =
        serde_json::from_str(stdout).map_err(|e| format!("malformed ffprobe output: {}", e))?;

    let raw = output
        .format
        .duration
        .ok_or_else(|| "ffprobe reported no duration".to_string())?;

    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("unparseable duration {:?}", raw))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("invalid duration {}", seconds));
    }

    Ok(seconds)
}
