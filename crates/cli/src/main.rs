//! planloop CLI: the main entry point.
//!
//! Commands:
//! - `run`    : Work toward a goal with the plan/act/reflect loop
//! - `tools`  : List the registered tools
//! - `config` : Print the effective (or default) configuration

use clap::{Parser, Subcommand};
use planloop_core::PlanFormat;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(
    name = "planloop",
    about = "planloop: goal-directed plan/act/reflect agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the loop until the goal is reached or the iteration cap is hit
    Run {
        /// The goal to work toward
        goal: String,

        /// Override the iteration cap
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Per-call model timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Extra attempts for a failed model call
        #[arg(long)]
        max_retries: Option<u32>,

        /// How tool calls are read from plans: auto, mentions or structured
        #[arg(long)]
        plan_format: Option<PlanFormat>,

        /// Replay model responses from a file instead of calling a provider
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available tools
    Tools,

    /// Print the effective configuration as TOML
    Config {
        /// Print the built-in defaults instead, as a starting config file
        #[arg(long)]
        defaults: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            goal,
            max_iterations,
            timeout,
            max_retries,
            plan_format,
            script,
            json,
        } => {
            commands::run::run(commands::run::RunArgs {
                goal,
                max_iterations,
                timeout,
                max_retries,
                plan_format,
                script,
                json,
            })
            .await
        }
        Commands::Tools => commands::tools::run().map(|()| ExitCode::SUCCESS),
        Commands::Config { defaults } => {
            commands::config_cmd::show(defaults).map(|()| ExitCode::SUCCESS)
        }
    }
}
