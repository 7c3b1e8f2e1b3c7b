//! Shared registries for loop tests.

use async_trait::async_trait;
use chrono::NaiveTime;
use planloop_core::error::ToolError;
use planloop_core::tool::{Tool, ToolArgs, ToolRegistry};
use planloop_tools::{EmailTool, GreetTool, TimeTool, WeatherTool};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn noon() -> TimeTool {
    TimeTool::fixed(NaiveTime::from_hms_opt(12, 0, 0).unwrap())
}

/// Only `get_time`, pinned to 12:00:00.
pub fn clock_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(noon())).unwrap();
    Arc::new(registry)
}

/// All stub tools, with the clock pinned so transcripts are reproducible.
pub fn stub_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(noon())).unwrap();
    registry.register(Box::new(WeatherTool)).unwrap();
    registry.register(Box::new(EmailTool::new())).unwrap();
    registry.register(Box::new(GreetTool)).unwrap();
    Arc::new(registry)
}

struct ExplodingTool;

#[async_trait]
impl Tool for ExplodingTool {
    fn name(&self) -> &str {
        "explode"
    }

    fn description(&self) -> &str {
        "Panics"
    }

    async fn execute(&self, _arguments: &ToolArgs) -> Result<String, ToolError> {
        panic!("boom");
    }
}

pub fn panicking_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ExplodingTool)).unwrap();
    Arc::new(registry)
}

struct DawdlingTool;

#[async_trait]
impl Tool for DawdlingTool {
    fn name(&self) -> &str {
        "dawdle"
    }

    fn description(&self) -> &str {
        "Takes an hour"
    }

    async fn execute(&self, _arguments: &ToolArgs) -> Result<String, ToolError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("finally".into())
    }
}

pub fn slow_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(DawdlingTool)).unwrap();
    Arc::new(registry)
}

/// Cancels the run's token from inside the Acting step.
struct AbortTool {
    cancel: CancellationToken,
}

#[async_trait]
impl Tool for AbortTool {
    fn name(&self) -> &str {
        "abort_run"
    }

    fn description(&self) -> &str {
        "Cancels the current run"
    }

    async fn execute(&self, _arguments: &ToolArgs) -> Result<String, ToolError> {
        self.cancel.cancel();
        Ok("cancelled".into())
    }
}

pub fn cancelling_registry(cancel: CancellationToken) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(AbortTool { cancel })).unwrap();
    registry.register(Box::new(noon())).unwrap();
    Arc::new(registry)
}
