//! Subtitle output: naming, rendering and writing SRT/TXT files.

pub mod srt;
pub mod text;

pub use srt::{format_srt_time, parse_srt, render_srt};
pub use text::render_text;

use crate::config::OutputFormat;
use crate::error::{Result, ScribeError};
use crate::stt::Segment;
use std::fs;
use std::path::{Path, PathBuf};

/// Where output files are placed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    #[default]
    BesideSource,
    Directory(PathBuf),
}

/// Output path `<dir>/<stem>[.<suffix>].<ext>` for a source file.
///
/// A blank suffix is treated as absent.
pub fn output_path(
    source: &Path,
    target: &OutputTarget,
    suffix: Option<&str>,
    format: OutputFormat,
) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match suffix.map(str::trim).filter(|s| !s.is_empty()) {
        Some(suffix) => format!("{}.{}.{}", stem, suffix, format.extension()),
        None => format!("{}.{}", stem, format.extension()),
    };

    let dir = match target {
        OutputTarget::BesideSource => source.parent().map(Path::to_path_buf).unwrap_or_default(),
        OutputTarget::Directory(dir) => dir.clone(),
    };
    dir.join(file_name)
}

/// Render and write one subtitle file, creating parent directories as needed.
///
/// An empty segment sequence still produces a file.
pub fn write_subtitle(
    path: &Path,
    format: OutputFormat,
    full_text: Option<&str>,
    segments: &[Segment],
) -> Result<()> {
    let contents = match format {
        OutputFormat::Srt => render_srt(segments),
        OutputFormat::Txt => render_text(full_text, segments),
    };

    let write_error = |e: std::io::Error| ScribeError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, contents).map_err(write_error)?;

    tracing::debug!(path = %path.display(), segments = segments.len(), "wrote subtitles");
    Ok(())
}
