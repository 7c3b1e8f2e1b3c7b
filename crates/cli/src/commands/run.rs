//! `planloop run`: work toward a goal and print the transcript.

use planloop::output::{exit_code, json_summary, render_text};
use planloop::session::build_loop;
use planloop_config::AppConfig;
use planloop_core::PlanFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct RunArgs {
    pub goal: String,
    pub max_iterations: Option<u32>,
    pub timeout: Option<u64>,
    pub max_retries: Option<u32>,
    pub plan_format: Option<PlanFormat>,
    pub script: Option<PathBuf>,
    pub json: bool,
}

pub async fn run(args: RunArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(max) = args.max_iterations {
        config.agent.max_iterations = max;
    }
    if let Some(secs) = args.timeout {
        config.completion.timeout_secs = secs;
    }
    if let Some(retries) = args.max_retries {
        config.agent.max_retries = retries;
    }
    if let Some(format) = args.plan_format {
        config.agent.plan_format = format;
    }
    config.validate()?;

    if args.script.is_none() && !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    PLANLOOP_API_KEY, OPENAI_API_KEY or OPENROUTER_API_KEY");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        eprintln!("  To try the loop offline, pass --script FILE.");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let agent = build_loop(&config, args.script.as_deref())?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            on_ctrl_c.cancel();
        }
    });

    let outcome = agent.run_with_cancel(&args.goal, cancel).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_summary(&outcome))?);
    } else {
        print!("{}", render_text(&outcome));
    }

    Ok(ExitCode::from(exit_code(&outcome)))
}
