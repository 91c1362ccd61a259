//! The ordered media queue and its editing operations.

use crate::defaults::SUPPORTED_EXTENSIONS;
use crate::error::{Result, ScribeError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Lifecycle of one queued file within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One media file in the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTask {
    pub path: PathBuf,
    pub display_name: String,
    pub status: TaskStatus,
    /// Cached probe result; `Some(0.0)` means probed but unknown.
    pub duration: Option<f64>,
    pub elapsed_seconds: f64,
}

impl MediaTask {
    pub fn new(path: PathBuf) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            display_name,
            status: TaskStatus::Pending,
            duration: None,
            elapsed_seconds: 0.0,
        }
    }

    /// Probed duration, 0 when unknown or not yet probed.
    pub fn duration_seconds(&self) -> f64 {
        self.duration.unwrap_or(0.0)
    }

    pub fn is_probed(&self) -> bool {
        self.duration.is_some()
    }
}

/// Ordered, de-duplicated list of media tasks.
#[derive(Debug, Clone, Default)]
pub struct MediaQueue {
    tasks: Vec<MediaTask>,
}

impl MediaQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[MediaTask] {
        &self.tasks
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut [MediaTask] {
        &mut self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&MediaTask> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.tasks.iter().any(|t| t.path == path)
    }

    /// Append paths not already queued, keeping existing order.
    ///
    /// Returns how many were added.
    pub fn append<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.into();
            if self.contains(&path) {
                tracing::debug!(file = %path.display(), "already queued, skipping");
                continue;
            }
            self.tasks.push(MediaTask::new(path));
            added += 1;
        }
        added
    }

    /// Recursively append every supported media file under `dir`, sorted by path.
    pub fn append_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut found = Vec::new();
        collect_media(dir, &mut found)?;
        found.sort();
        Ok(self.append(found))
    }

    /// Remove the closed index range `[lo, hi]`.
    pub fn remove_range(&mut self, lo: usize, hi: usize) -> Result<()> {
        self.check_range(lo, hi)?;
        self.tasks.drain(lo..=hi);
        Ok(())
    }

    /// Move the block `[lo, hi]` one position up (`delta = -1`) or down (`delta = 1`).
    ///
    /// The queue is unchanged when the move would leave the bounds.
    pub fn move_range(&mut self, lo: usize, hi: usize, delta: isize) -> Result<()> {
        self.check_range(lo, hi)?;
        match delta {
            -1 => {
                if lo == 0 {
                    return Err(range_error(format!("cannot move [{}, {}] above the top", lo, hi)));
                }
                self.tasks[lo - 1..=hi].rotate_left(1);
            }
            1 => {
                if hi + 1 >= self.tasks.len() {
                    return Err(range_error(format!(
                        "cannot move [{}, {}] below the bottom",
                        lo, hi
                    )));
                }
                self.tasks[lo..=hi + 1].rotate_right(1);
            }
            other => {
                return Err(range_error(format!("delta must be -1 or 1, got {}", other)));
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    fn check_range(&self, lo: usize, hi: usize) -> Result<()> {
        if lo > hi {
            return Err(range_error(format!("start {} is after end {}", lo, hi)));
        }
        if hi >= self.tasks.len() {
            return Err(range_error(format!(
                "end {} is out of bounds for {} queued files",
                hi,
                self.tasks.len()
            )));
        }
        Ok(())
    }
}

fn range_error(message: String) -> ScribeError {
    ScribeError::Range { message }
}

/// Whether a path carries one of the supported media extensions (case-insensitive).
pub fn is_supported_media(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
}

fn collect_media(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_media(&path, found)?;
        } else if is_supported_media(&path) {
            found.push(path);
        }
    }
    Ok(())
}
