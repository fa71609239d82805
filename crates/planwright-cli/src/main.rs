//! Planwright - business plans from a short questionnaire
//!
//! - `planwright serve` - HTTP API with SSE progress
//! - `planwright generate` - run one generation locally, events as JSON lines
//! - `planwright inspect` - debug view of stored plans

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use planwright_core::constants::plan::DEFAULT_LIST_LIMIT;
use planwright_core::PlanwrightConfig;

mod generate;
mod inspect;
mod serve;

/// Planwright - Business Plan Generator
#[derive(Parser)]
#[command(name = "planwright")]
#[command(about = "Generate business plans from a short questionnaire", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (defaults to PORT or the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate a plan from a questionnaire JSON file
    ///
    /// Progress events are printed to stdout, one JSON object per line.
    /// Logs go to stderr.
    Generate {
        /// Path to the questionnaire (camelCase JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show stored plans and which sections they contain
    Inspect {
        /// Plan ID (defaults to the most recent plans)
        id: Option<String>,

        /// How many recent plans to show
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
}

fn init_logging(to_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Serve logs to stdout; the other commands keep stdout for their output
    init_logging(!matches!(cli.command, Commands::Serve { .. }));

    let config = PlanwrightConfig::load()?;

    match cli.command {
        Commands::Serve { port } => serve::run(config, port).await,
        Commands::Generate { input } => generate::run(config, &input).await,
        Commands::Inspect { id, limit } => inspect::run(&config, id.as_deref(), limit),
    }
}
