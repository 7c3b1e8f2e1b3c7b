//! Assembling a ready-to-run loop from configuration.

use planloop_agent::PlanActReflectLoop;
use planloop_config::AppConfig;
use planloop_core::Provider;
use planloop_providers::{ScriptedProvider, build_from_config};
use std::path::Path;
use std::sync::Arc;

/// Build the loop a `run` invocation uses.
///
/// With `script` the model is replayed from that file; otherwise the
/// configured provider (or fallback chain) is used. Tools are the built-in
/// stubs.
pub fn build_loop(config: &AppConfig, script: Option<&Path>) -> planloop_core::Result<PlanActReflectLoop> {
    let provider: Arc<dyn Provider> = match script {
        Some(path) => Arc::new(ScriptedProvider::from_file(path)?),
        None => build_from_config(config)?.resolve(config.completion_timeout())?,
    };
    let tools = Arc::new(planloop_tools::default_registry()?);

    let agent = PlanActReflectLoop::from_config(provider, tools, config);
    if script.is_none() && !config.fallback_providers.is_empty() {
        // each chain entry already carries the per-call timeout
        return Ok(agent.with_completion_timeout(None));
    }
    Ok(agent)
}
