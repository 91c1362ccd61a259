use anyhow::Result;
use batchscribe::app::{installed_models, probe_files, run_batch_command};
use batchscribe::cli::{Cli, Commands, ConfigAction};
use batchscribe::config::Config;
use batchscribe::pipeline::{BatchOutcome, BatchReport, format_hms};
use batchscribe::queue::TaskStatus;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    batchscribe::logging::init(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            args.apply(&mut config);
            let report = run_batch_command(config, args.inputs).await?;
            print_summary(&report, cli.quiet);
            if report.is_aborted() {
                std::process::exit(1);
            }
        }
        Commands::Probe { files } => {
            let config = load_config(cli.config.as_deref())?;
            let mut failed = false;
            for (path, result) in probe_files(&config, &files) {
                match result {
                    Ok(seconds) => {
                        println!("{}  {:.3}s  {}", format_hms(seconds), seconds, path.display())
                    }
                    Err(e) => {
                        failed = true;
                        eprintln!("{} {}: {}", "error".red(), path.display(), e);
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
        }
        Commands::Models { dir } => {
            let config = load_config(cli.config.as_deref())?;
            let (dir, models) = installed_models(&config, dir.as_deref());
            if models.is_empty() {
                eprintln!("No models found in {}", dir.display());
                eprintln!(
                    "{}",
                    "Place ggml-<name>.bin files there or set engine.model_dir".dimmed()
                );
            } else {
                println!("Models in {}:", dir.display());
                for model in models {
                    let marker = if model == config.engine.model { "*" } else { " " };
                    println!("  {} {}", marker.green(), model);
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Dump => {
                let config = load_config(cli.config.as_deref())?;
                print!("{}", config.to_toml()?);
            }
        },
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "batchscribe",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from a custom path, or the default location.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    // Apply environment variable overrides
    Ok(config.with_env_overrides())
}

fn print_summary(report: &BatchReport, quiet: bool) {
    if let BatchOutcome::Aborted(error) = &report.outcome {
        eprintln!("{} {}", "Batch aborted:".red().bold(), error);
        return;
    }

    if !quiet {
        for file in &report.files {
            let name = file.path.display();
            match file.status {
                TaskStatus::Done => {
                    let output = file
                        .output_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    eprintln!("  {} {} -> {}", "done".green(), name, output.dimmed());
                }
                TaskStatus::Failed => {
                    let reason = file
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_default();
                    eprintln!("  {} {}: {}", "failed".red(), name, reason);
                }
                TaskStatus::Pending | TaskStatus::Running => {
                    eprintln!("  {} {}", "pending".yellow(), name);
                }
            }
        }
    }

    let done = report.count(TaskStatus::Done);
    let failed = report.count(TaskStatus::Failed);
    let pending = report.files.len() - done - failed;
    let headline = match report.outcome {
        BatchOutcome::Cancelled => "Batch cancelled",
        _ => "Batch finished",
    };
    eprintln!(
        "{} in {}: {} done, {} failed, {} pending",
        headline,
        humantime::format_duration(std::time::Duration::from_secs(report.elapsed.as_secs())),
        done.green(),
        failed.red(),
        pending.yellow(),
    );
}
