//! embedctl - Deployment orchestrator for the Nomic embedding service
//!
//! Builds the service image, replaces any prior instance, waits for the
//! health endpoint to answer, smoke-tests the embedding routes, and prints
//! operational instructions.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod constants;
mod error;
mod output;
mod probe;
mod runtime;

use commands::*;
use config::DeployConfig;
use output::OutputFormat;

/// Local deployment for the containerized embedding-inference service.
///
/// embedctl verifies the service files, builds the image, replaces any
/// running instance, waits for readiness and smoke-tests the HTTP routes.
#[derive(Parser)]
#[command(name = "embedctl")]
#[command(author, version)]
#[command(about = "Deploy and manage the containerized embedding service")]
#[command(propagate_version = true)]
#[command(next_help_heading = "Options")]
#[command(after_help = "Quick Start:
  embedctl deploy     Build and launch the service (run this first)
  embedctl status     Check instance and health state
  embedctl smoke      Exercise the HTTP endpoints
  embedctl down       Stop and remove the instance

Examples:
  embedctl deploy --timeout-secs 300   Allow a long first model download
  embedctl logs -n 50                  Show the last 50 log lines
  embedctl smoke --batch               Also exercise /embed/batch")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, launch and verify the service in one step
    #[command(visible_alias = "up")]
    Deploy {
        /// Working directory containing the service files
        #[arg(default_value = ".")]
        path: String,

        /// Skip the HTTP smoke tests after launch
        #[arg(long)]
        skip_smoke: bool,

        /// Override the readiness deadline in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Run preflight checks without deploying
    Doctor {
        /// Working directory to check
        #[arg(default_value = ".")]
        path: String,
    },

    /// Show instance state and live health
    #[command(visible_alias = "st")]
    Status {
        /// Working directory (for .embedrc.toml)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Print the instance's log tail
    Logs {
        /// Working directory (for .embedrc.toml)
        #[arg(default_value = ".")]
        path: String,

        /// Number of log lines to show
        #[arg(short = 'n', long, default_value_t = constants::DEFAULT_LOG_TAIL_LINES)]
        lines: u32,

        /// Stream logs until interrupted
        #[arg(short, long)]
        follow: bool,
    },

    /// Exercise the service's HTTP endpoints
    Smoke {
        /// Working directory (for .embedrc.toml)
        #[arg(default_value = ".")]
        path: String,

        /// Also exercise the batch embedding route
        #[arg(long)]
        batch: bool,

        /// Text to embed instead of the built-in sample
        #[arg(long)]
        text: Option<String>,
    },

    /// Stop and remove the deployed instance
    #[command(visible_alias = "stop")]
    Down {
        /// Working directory (for .embedrc.toml)
        #[arg(default_value = ".")]
        path: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: completions::Shell,

        /// Show installation instructions instead of generating completions
        #[arg(long)]
        instructions: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration from .embedrc.toml in the current directory
    let config = DeployConfig::load(std::path::Path::new("."));

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    // Apply color override from config if set
    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    // Handle case where no command is provided
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Deploy {
            path,
            skip_smoke,
            timeout_secs,
        } => deploy::run(&path, skip_smoke, timeout_secs, format).await,
        Commands::Doctor { path } => doctor::run(&path, format).await,
        Commands::Status { path } => status::run(&path, format).await,
        Commands::Logs {
            path,
            lines,
            follow,
        } => logs::run(&path, lines, follow, format).await,
        Commands::Smoke { path, batch, text } => {
            smoke::run(&path, batch, text.as_deref(), format).await
        }
        Commands::Down { path, yes } => down::run(&path, yes, format).await,
        Commands::Completions {
            shell,
            instructions,
        } => {
            if instructions {
                completions::run(shell, true, format)
            } else {
                let mut cmd = Cli::command();
                completions::generate_completions_with_cmd(shell, &mut cmd);
                Ok(())
            }
        }
    }
}
