//! acton-scaffold CLI tool

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use std::path::PathBuf;

use acton_scaffold::config::ProjectContext;
use acton_scaffold::observability::{self, LogFormat};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use commands::GenerateCommand;

#[derive(Parser)]
#[command(name = "acton-scaffold")]
#[command(version)]
#[command(about = "Model and controller scaffolding for acton-htmx projects", long_about = None)]
struct Cli {
    /// Project root every configured path is relative to
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_root: PathBuf,

    /// Configuration file (default: <project root>/acton-scaffold.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate models and controllers
    Generate {
        #[command(subcommand)]
        command: GenerateCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    observability::init(cli.verbose, cli.log_format).context("Failed to initialize logging")?;

    let context = ProjectContext::load(&cli.project_root, cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Generate { command } => {
            command.execute(&context)?;
        }
    }

    Ok(())
}
