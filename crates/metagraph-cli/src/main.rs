//! Metagraph CLI - Project entity snapshots into graph and search updates

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;
mod pipeline;

use commands::{completions, config as config_cmd, process, replay};
use config::{config_file_path, Config};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "metagraph")]
#[command(author, version, about = "Project metadata snapshots into graph and search updates")]
pub struct Cli {
    /// Output format: json, pretty, table (default from config)
    #[arg(short, long, global = true)]
    pub format: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Derive entities, relationship updates and documents from snapshots
    Process(process::ProcessArgs),
    /// Replay snapshots as change events into in-memory sinks
    Replay(replay::ReplayArgs),
    /// Manage configuration
    Config(config_cmd::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Settings resolved once at startup and shared by every command
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub format: OutputFormat,
}

impl AppContext {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = config_file_path();
        let config = match Config::load_from(&config_path) {
            Ok(config) => config,
            // Config commands must still run against a broken file
            Err(e) if matches!(cli.command, Commands::Config(_)) => {
                eprintln!("warning: {:#}", e);
                Config::default()
            }
            Err(e) => return Err(e),
        };

        let format: OutputFormat = cli
            .format
            .as_deref()
            .unwrap_or(&config.output_format)
            .parse()?;

        Ok(Self {
            config,
            config_path,
            format,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::new(&cli)?;

    // Set up logging based on verbosity, falling back to the configured level
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => ctx.config.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting metagraph CLI");

    match &cli.command {
        Commands::Process(args) => process::run(args, &ctx).await?,
        Commands::Replay(args) => replay::run(args, &ctx).await?,
        Commands::Config(args) => config_cmd::run(args, &ctx.config, &ctx.config_path)?,
        Commands::Completions(args) => completions::run(args)?,
    }

    Ok(())
}
