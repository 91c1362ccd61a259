//! Command-line interface for batchscribe
//!
//! Provides argument parsing using clap derive macros.

use crate::config::{Config, OutputFormat, TranscriptionMode};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Batch transcription of media files into subtitles
#[derive(Parser, Debug)]
#[command(
    name = "batchscribe",
    version,
    about = "Batch transcription of media files into SRT/TXT subtitles"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe files and directories into subtitle files
    Run(RunArgs),

    /// Print the probed duration of media files
    Probe {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// List Whisper models installed in the model directory
    Models {
        /// Directory to scan (default: engine.model_dir or the cache directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Dump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Chunked,
    WholeFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Srt,
    Txt,
}

/// Arguments for `batchscribe run`; each flag overrides the config file.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Media files and directories (directories are scanned recursively)
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Whisper model name or path to a model file
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Language code (default: auto-detect). Examples: auto, en, zh, ja
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Transcribe whole files or fixed-length windows
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Window length for chunked mode. Examples: 60, 90s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
    pub window: Option<f64>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Extra name part: <name>.<suffix>.<ext>
    #[arg(long, value_name = "SUFFIX")]
    pub suffix: Option<String>,

    /// Write all outputs into this directory instead of beside each source
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Interval between status reports. Examples: 30s, 1m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
    pub status_interval: Option<f64>,

    /// Directory for temporary chunk files
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,
}

impl RunArgs {
    /// Overlay command-line flags onto the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.engine.model = model.clone();
        }
        if let Some(language) = &self.language {
            config.engine.language = language.clone();
        }
        if let Some(mode) = self.mode {
            config.batch.mode = match mode {
                ModeArg::Chunked => TranscriptionMode::Chunked,
                ModeArg::WholeFile => TranscriptionMode::WholeFile,
            };
        }
        if let Some(window) = self.window {
            config.batch.window_secs = window;
        }
        if let Some(format) = self.format {
            config.batch.format = match format {
                FormatArg::Srt => OutputFormat::Srt,
                FormatArg::Txt => OutputFormat::Txt,
            };
        }
        if let Some(suffix) = &self.suffix {
            config.batch.suffix = Some(suffix.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.batch.output_dir = Some(dir.clone());
        }
        if let Some(interval) = self.status_interval {
            config.batch.status_interval_secs = interval.ceil() as u64;
        }
        if let Some(dir) = &self.temp_dir {
            config.batch.temp_dir = Some(dir.clone());
        }
    }
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_duration_secs(s: &str) -> Result<f64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<f64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs_f64())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_parses_inputs_and_flags() {
        let cli = Cli::try_parse_from([
            "batchscribe",
            "-v",
            "run",
            "a.mp4",
            "videos/",
            "--mode",
            "whole-file",
            "--format",
            "txt",
            "--suffix",
            "zh",
            "--window",
            "90s",
            "--status-interval",
            "1m",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("Expected run command");
        };
        assert_eq!(args.inputs, vec![PathBuf::from("a.mp4"), PathBuf::from("videos/")]);
        assert_eq!(args.mode, Some(ModeArg::WholeFile));
        assert_eq!(args.format, Some(FormatArg::Txt));
        assert_eq!(args.window, Some(90.0));
        assert_eq!(args.status_interval, Some(60.0));
    }

    #[test]
    fn test_run_requires_inputs() {
        assert!(Cli::try_parse_from(["batchscribe", "run"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["batchscribe", "probe", "a.mp4", "-q", "--config", "c.toml"])
            .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn test_apply_overrides_config() {
        let args = RunArgs {
            inputs: vec![PathBuf::from("a.mp4")],
            model: Some("small".to_string()),
            language: Some("ja".to_string()),
            mode: Some(ModeArg::WholeFile),
            window: Some(30.0),
            format: Some(FormatArg::Txt),
            suffix: Some("ja".to_string()),
            output_dir: Some(PathBuf::from("/out")),
            status_interval: Some(0.5),
            temp_dir: Some(PathBuf::from("/scratch")),
        };

        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.engine.model, "small");
        assert_eq!(config.engine.language, "ja");
        assert_eq!(config.batch.mode, TranscriptionMode::WholeFile);
        assert_eq!(config.batch.window_secs, 30.0);
        assert_eq!(config.batch.format, OutputFormat::Txt);
        assert_eq!(config.batch.suffix.as_deref(), Some("ja"));
        assert_eq!(config.batch.output_dir, Some(PathBuf::from("/out")));
        assert_eq!(config.batch.status_interval_secs, 1);
        assert_eq!(config.batch.temp_dir, Some(PathBuf::from("/scratch")));
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let args = RunArgs {
            inputs: vec![PathBuf::from("a.mp4")],
            ..RunArgs::default()
        };
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("45"), Ok(45.0));
        assert_eq!(parse_duration_secs("1.5"), Ok(1.5));
        assert_eq!(parse_duration_secs("2m"), Ok(120.0));
        assert_eq!(parse_duration_secs("1h30m"), Ok(5400.0));
        assert!(parse_duration_secs("soon").is_err());
    }

    #[test]
    fn test_completions_accepts_shell() {
        let cli = Cli::try_parse_from(["batchscribe", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Commands::Completions { shell: Shell::Bash }));
    }
}
