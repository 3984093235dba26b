//! fragload CLI - Command-line interface for fragmented uploads
//!
//! Provides commands for:
//! - Uploading local files in fixed-size fragments
//! - Saving and deleting files already on the server
//! - Viewing and managing configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fragload_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand,
    remote::{DeleteCommand, SaveCommand},
    upload::UploadCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "fragload", version, about = "Upload large files in fragments")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload local files
    Upload(UploadCommand),
    /// Save metadata of a file already on the server
    Save(SaveCommand),
    /// Delete a file from the server
    Delete(DeleteCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Loads the configuration; an explicitly given file must exist and parse
fn load_config(explicit: Option<&PathBuf>) -> Result<(Config, PathBuf)> {
    match explicit {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            Ok((config, path.clone()))
        }
        None => {
            let path = Config::default_path();
            Ok((Config::load_or_default(&path), path))
        }
    }
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = load_config(cli.config.as_ref())?;

    // Setup tracing
    let filter = default_filter(cli.verbose, &config.logging.level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Upload(cmd) => cmd.execute(&config, format).await,
        Commands::Save(cmd) => cmd.execute(&config, format).await,
        Commands::Delete(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
    }
}
