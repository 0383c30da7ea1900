mod output;
mod plan;
mod up;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use migrator_core::config::{MigratorConfig, SplitMode};

/// Apply ordered SQL migrations to a PostgreSQL database.
#[derive(Parser)]
#[command(name = "migrator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// CLI commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run every migration file in order (default).
    Up,

    /// List the statements a run would execute, without connecting.
    Plan,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file path (optional).
    #[arg(short, long, default_value = "migrator.toml", global = true)]
    pub config: PathBuf,

    /// Migrations directory path (overrides config).
    #[arg(short = 'd', long = "dir", global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Database connection URL.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    pub database_url: Option<String>,

    /// Statement splitter: heuristic or tokenizer (overrides config).
    ///
    /// The heuristic splitter only cuts at a `;` ending a line, so statements
    /// sharing a line run and skip together; tokenizer splits them.
    #[arg(long, global = true)]
    pub splitter: Option<SplitMode>,

    /// Print the run summary as JSON instead of progress lines.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load the config file (if any) and apply command-line overrides.
    pub fn load_config(&self) -> Result<MigratorConfig> {
        let mut config = MigratorConfig::load_or_default(&self.config)?;

        if let Some(dir) = &self.migrations_dir {
            config.migrations.dir = dir.clone();
        }
        if let Some(splitter) = self.splitter {
            config.migrations.splitter = splitter;
        }

        Ok(config)
    }
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        init_tracing(self.global.verbose);

        match self.command.unwrap_or(Commands::Up) {
            Commands::Up => up::execute(&self.global).await,
            Commands::Plan => plan::execute(&self.global),
        }
    }
}

/// Log to stderr so stdout carries only progress and JSON.
fn init_tracing(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
