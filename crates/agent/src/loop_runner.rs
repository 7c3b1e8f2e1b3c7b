//! The plan/act/reflect loop implementation.
//!
//! One run walks the state machine
//!
//! ```text
//! Planning -> Acting -> Reflecting -> Done
//!    ^                       |
//!    +------- not done ------+          (any state) -> Failed
//! ```
//!
//! Tool failures never end a run; they are folded into the aggregate
//! result. A completion failure that outlives its retries, the iteration
//! cap, or cancellation ends the run in `Failed`.

use chrono::Utc;
use planloop_config::AppConfig;
use planloop_core::error::{CompletionError, LoopError, Stage};
use planloop_core::event::{EventBus, LoopEvent};
use planloop_core::provider::{CompletionOptions, CompletionRequest, Provider, complete_with_timeout};
use planloop_core::transcript::{ActionResult, Transcript, TranscriptEntry, aggregate};
use planloop_core::{LoopState, LoopStatus, PlanFormat, ToolRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::plan::parse_plan;
use crate::prompt::{is_complete, plan_prompt, reflection_prompt};

/// A successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub goal: String,
    pub transcript: Transcript,
    pub iterations: u32,
    pub planning_entries: u32,
    pub status: LoopStatus,
}

/// A run that ended in `Failed`, with the state it reached.
///
/// A cancelled run carries an empty transcript: partial work is discarded.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: LoopError,
    pub state: LoopState,
}

/// Drives a bounded plan -> act -> reflect cycle toward a goal.
///
/// The loop itself holds only configuration. Every call to [`run`](Self::run)
/// owns a fresh [`LoopState`], so one loop value may serve many concurrent
/// runs that share the provider and the read-only tool registry.
pub struct PlanActReflectLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    options: CompletionOptions,
    max_iterations: u32,
    max_retries: u32,
    completion_marker: String,
    plan_format: PlanFormat,
    completion_timeout: Option<Duration>,
    tool_timeout: Option<Duration>,
    event_bus: Option<Arc<EventBus>>,
}

impl PlanActReflectLoop {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            options: CompletionOptions {
                temperature: 0.0,
                max_tokens: Some(150),
                stop: Vec::new(),
            },
            max_iterations: 5,
            max_retries: 0,
            completion_marker: "YES".into(),
            plan_format: PlanFormat::Auto,
            completion_timeout: None,
            tool_timeout: None,
            event_bus: None,
        }
    }

    /// Build a loop with every setting taken from configuration.
    pub fn from_config(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: &AppConfig) -> Self {
        Self::new(provider, tools, config.model_for(&config.default_provider))
            .with_options(config.completion_options())
            .with_max_iterations(config.agent.max_iterations)
            .with_max_retries(config.agent.max_retries)
            .with_completion_marker(&config.agent.completion_marker)
            .with_plan_format(config.agent.plan_format)
            .with_completion_timeout(config.completion_timeout())
            .with_tool_timeout(config.tool_timeout())
    }

    /// Cap on plan/act/reflect iterations. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Extra attempts for each failed model call.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_completion_marker(mut self, marker: impl Into<String>) -> Self {
        self.completion_marker = marker.into();
        self
    }

    pub fn with_plan_format(mut self, format: PlanFormat) -> Self {
        self.plan_format = format;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Run the loop to completion.
    pub async fn run(&self, goal: &str) -> Result<RunReport, RunFailure> {
        self.run_with_cancel(goal, CancellationToken::new()).await
    }

    /// Run the loop, giving up as soon as `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        goal: &str,
        cancel: CancellationToken,
    ) -> Result<RunReport, RunFailure> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut state = LoopState::new(goal);

        info!(
            run_id = %run_id,
            model = %self.model,
            max_iterations = self.max_iterations,
            plan_format = %self.plan_format,
            "Plan/act/reflect run starting"
        );
        self.publish(|| LoopEvent::RunStarted {
            run_id: run_id.clone(),
            goal: goal.to_string(),
            timestamp: Utc::now(),
        });

        let outcome = self.drive(&run_id, &mut state, &cancel).await;

        match outcome {
            Ok(()) => {
                self.set_status(&run_id, &mut state, LoopStatus::Done);
                info!(run_id = %run_id, iterations = state.iteration, "Goal reached");
                self.publish(|| LoopEvent::RunFinished {
                    run_id: run_id.clone(),
                    status: LoopStatus::Done,
                    iterations: state.iteration,
                    error: None,
                    timestamp: Utc::now(),
                });
                Ok(RunReport {
                    run_id,
                    goal: state.goal,
                    transcript: state.transcript,
                    iterations: state.iteration,
                    planning_entries: state.planning_entries,
                    status: LoopStatus::Done,
                })
            }
            Err(error) => {
                self.set_status(&run_id, &mut state, LoopStatus::Failed);
                if error.is_cancelled() {
                    state.transcript = Transcript::new();
                }
                warn!(run_id = %run_id, iterations = state.iteration, error = %error, "Run failed");
                self.publish(|| LoopEvent::RunFinished {
                    run_id: run_id.clone(),
                    status: LoopStatus::Failed,
                    iterations: state.iteration,
                    error: Some(error.to_string()),
                    timestamp: Utc::now(),
                });
                Err(RunFailure { error, state })
            }
        }
    }

    async fn drive(
        &self,
        run_id: &str,
        state: &mut LoopState,
        cancel: &CancellationToken,
    ) -> Result<(), LoopError> {
        loop {
            // --- Planning ---
            checkpoint(cancel, Stage::Planning)?;
            self.set_status(run_id, state, LoopStatus::Planning);
            state.planning_entries += 1;
            if state.iteration >= self.max_iterations {
                return Err(LoopError::IterationLimitExceeded {
                    max_iterations: self.max_iterations,
                });
            }
            state.iteration += 1;

            let prompt = plan_prompt(&state.goal, &self.tools, self.plan_format, &state.transcript);
            let plan_text = self.complete(run_id, Stage::Planning, prompt, cancel).await?;
            let plan = parse_plan(&plan_text, &self.tools, self.plan_format);
            debug!(
                run_id = %run_id,
                iteration = state.iteration,
                invocations = plan.invocations.len(),
                "Plan parsed"
            );

            // --- Acting ---
            checkpoint(cancel, Stage::Planning)?;
            self.set_status(run_id, state, LoopStatus::Acting);
            let mut actions = Vec::with_capacity(plan.invocations.len());
            for invocation in plan.invocations {
                checkpoint(cancel, Stage::Acting)?;
                let start = Instant::now();
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(LoopError::Cancelled { stage: Stage::Acting }),
                    result = self.tools.invoke_with_timeout(
                        &invocation.tool,
                        invocation.arguments.clone(),
                        self.tool_timeout,
                    ) => result,
                };
                let duration_ms = start.elapsed().as_millis() as u64;

                match &result {
                    Ok(_) => debug!(run_id = %run_id, tool = %invocation.tool, duration_ms, "Tool succeeded"),
                    Err(e) => warn!(run_id = %run_id, tool = %invocation.tool, error = %e, "Tool failed"),
                }
                self.publish(|| LoopEvent::ToolExecuted {
                    run_id: run_id.to_string(),
                    tool_name: invocation.tool.clone(),
                    success: result.is_ok(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
                actions.push(ActionResult::from_result(
                    invocation.tool,
                    invocation.arguments,
                    &result,
                ));
            }
            let aggregate = aggregate(&actions);

            // --- Reflecting ---
            checkpoint(cancel, Stage::Acting)?;
            self.set_status(run_id, state, LoopStatus::Reflecting);
            let prompt = reflection_prompt(&state.goal, &aggregate, &self.completion_marker);
            let reflection = self.complete(run_id, Stage::Reflecting, prompt, cancel).await?;
            let done = is_complete(&reflection, &self.completion_marker);

            state.transcript.push(TranscriptEntry {
                iteration: state.iteration,
                plan: plan.text,
                actions,
                aggregate,
                reflection,
            });

            if done {
                return Ok(());
            }
            debug!(run_id = %run_id, iteration = state.iteration, "Goal not reached yet");
        }
    }

    /// One model call with retries, raced against cancellation.
    async fn complete(
        &self,
        run_id: &str,
        stage: Stage,
        prompt: String,
        cancel: &CancellationToken,
    ) -> Result<String, LoopError> {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let request = CompletionRequest::new(&self.model, prompt.clone())
                .with_options(self.options.clone());
            let start = Instant::now();

            let result: Result<_, CompletionError> = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LoopError::Cancelled { stage }),
                result = complete_with_timeout(self.provider.as_ref(), request, self.completion_timeout) => result,
            };

            match result {
                Ok(completion) => {
                    self.publish(|| LoopEvent::CompletionReceived {
                        run_id: run_id.to_string(),
                        model: completion.model.clone(),
                        tokens_used: completion.usage.map(|u| u.total_tokens),
                        duration_ms: start.elapsed().as_millis() as u64,
                        timestamp: Utc::now(),
                    });
                    return Ok(completion.text);
                }
                Err(e) if attempt < max_attempts => {
                    warn!(
                        run_id = %run_id,
                        %stage,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Completion failed, retrying"
                    );
                }
                Err(e) => {
                    return Err(LoopError::Completion {
                        stage,
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    fn set_status(&self, run_id: &str, state: &mut LoopState, status: LoopStatus) {
        state.status = status;
        debug!(run_id = %run_id, iteration = state.iteration, %status, "State transition");
        self.publish(|| LoopEvent::StatusChanged {
            run_id: run_id.to_string(),
            iteration: state.iteration,
            status,
            timestamp: Utc::now(),
        });
    }

    fn publish(&self, event: impl FnOnce() -> LoopEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event());
        }
    }
}

fn checkpoint(cancel: &CancellationToken, stage: Stage) -> Result<(), LoopError> {
    if cancel.is_cancelled() {
        warn!(%stage, "Run cancelled");
        return Err(LoopError::Cancelled { stage });
    }
    Ok(())
}
