//! Testable execution of the external media tools.
//!
//! `ffprobe` and `ffmpeg` are only ever reached through [`CommandExecutor`],
//! so probing and extraction can be driven by a scripted executor in tests.

use crate::error::{Result, ScribeError};
use std::process::Command;
use std::sync::Arc;

/// Trait for executing system commands.
///
/// Object-safe, Send + Sync so one executor can be shared by the probe and
/// the extractor.
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with arguments.
    ///
    /// Returns the stdout of the command on success.
    /// Returns an error if the command fails or is not found.
    fn execute(&self, command: &str, args: &[&str]) -> Result<String>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for Arc<T> {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        (**self).execute(command, args)
    }
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        tracing::trace!(command, ?args, "spawning external tool");

        let output = Command::new(command).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScribeError::ToolNotFound {
                    tool: command.to_string(),
                }
            } else {
                ScribeError::ToolFailed {
                    tool: command.to_string(),
                    message: format!("failed to execute: {}", e),
                }
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::ToolFailed {
                tool: command.to_string(),
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
