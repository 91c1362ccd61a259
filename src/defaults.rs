//! Default configuration constants for batchscribe.
//!
//! Shared by the config layer, the CLI, and the pipeline so the documented
//! defaults live in one place.

/// Sample rate of extracted chunk artifacts, in Hz.
///
/// 16kHz mono is what Whisper-family engines expect as input.
pub const SAMPLE_RATE: u32 = 16000;

/// Default chunk window length in seconds.
///
/// Bounds the amount of audio handed to the engine per call.
pub const WINDOW_SECS: f64 = 60.0;

/// Default interval between status reports, in seconds.
pub const STATUS_INTERVAL_SECS: u64 = 60;

/// Upper bound on how long the status reporter may take to notice a stop request.
pub const REPORTER_STOP_LATENCY_MS: u64 = 1000;

/// Default Whisper model name.
pub const DEFAULT_MODEL: &str = "base";

/// Default language code for transcription.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default duration probing program.
pub const FFPROBE: &str = "ffprobe";

/// Default chunk extraction program.
pub const FFMPEG: &str = "ffmpeg";

/// Media file extensions picked up when a directory is imported (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "m4a", "mp3", "mp4", "wav", "avi", "vob", "mov", "mkv", "aac", "flac", "ogg", "webm", "flv",
    "rmvb", "wmv",
];

/// Report the GPU backend compiled into this build.
///
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_are_lowercase_without_dot() {
        for ext in SUPPORTED_EXTENSIONS {
            assert_eq!(*ext, ext.to_lowercase());
            assert!(!ext.starts_with('.'));
        }
    }

    #[test]
    fn stop_latency_is_sub_interval() {
        assert!(REPORTER_STOP_LATENCY_MS < STATUS_INTERVAL_SECS * 1000);
    }
}
