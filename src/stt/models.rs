//! Local model discovery.
//!
//! Models are `ggml-<name>.bin` files in a model directory. There is no
//! download step; models are installed by the user.

use crate::error::{Result, ScribeError};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the default directory where models are looked up.
///
/// Uses `~/.cache/batchscribe/models/` on Linux/Unix.
pub fn default_models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("batchscribe")
        .join("models")
}

/// File name for a model name, e.g. `base.en` → `ggml-base.en.bin`.
pub fn model_file_name(name: &str) -> String {
    format!("ggml-{}.bin", name)
}

/// Resolve a configured model to a file on disk.
///
/// `model` may be a path to an existing file, or a name looked up as
/// `ggml-<name>.bin` in `model_dir` (when given) and then the default
/// models directory.
pub fn resolve_model_path(model: &str, model_dir: Option<&Path>) -> Result<PathBuf> {
    let as_path = Path::new(model);
    if as_path.is_file() {
        return Ok(as_path.to_path_buf());
    }

    let file_name = model_file_name(model);
    let default_dir = default_models_dir();
    let candidates: Vec<PathBuf> = model_dir
        .into_iter()
        .map(Path::to_path_buf)
        .chain(std::iter::once(default_dir))
        .map(|dir| dir.join(&file_name))
        .collect();

    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| ScribeError::ModelNotFound {
            path: candidates
                .first()
                .map(|p| p.display().to_string())
                .unwrap_or(file_name),
        })
}

/// List model names in a directory by scanning for `ggml-*.bin` files.
///
/// Returns model names (with the `ggml-` prefix and `.bin` suffix stripped),
/// sorted. A missing directory yields an empty list.
pub fn list_local_models(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name();
            let name = name.to_str()?;
            let model = name.strip_prefix("ggml-")?.strip_suffix(".bin")?;
            if entry.path().is_file() {
                Some(model.to_string())
            } else {
                None
            }
        })
        .collect();

    names.sort();
    names
}
