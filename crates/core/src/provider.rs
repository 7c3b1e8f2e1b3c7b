//! Provider trait: the text-completion boundary.
//!
//! The loop treats the language model as an opaque text-in/text-out
//! function. A Provider knows how to turn a prompt into response text;
//! which backend it talks to is invisible to the loop.
//!
//! Implementations: OpenAI-compatible HTTP endpoints, fallback chains,
//! and a scripted provider for deterministic tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CompletionError;

/// Sampling options for a completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Temperature (0.0 = deterministic, higher = more diverse)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.0
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: None,
            stop: Vec::new(),
        }
    }
}

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The prompt text
    pub prompt: String,

    #[serde(default)]
    pub options: CompletionOptions,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: CompletionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The response text plus provider metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    pub usage: Option<Usage>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: String::new(),
            usage: None,
        }
    }
}

/// The core Provider trait.
///
/// The loop calls `complete()` without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "scripted").
    fn name(&self) -> &str;

    /// Send a prompt and get the complete response text.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<Completion, CompletionError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        Ok(true)
    }
}

/// Run `complete()` bounded by an optional timeout.
///
/// Expiry surfaces as [`CompletionError::Timeout`], so callers handle it
/// like any other completion failure.
pub async fn complete_with_timeout(
    provider: &dyn Provider,
    request: CompletionRequest,
    timeout: Option<Duration>,
) -> std::result::Result<Completion, CompletionError> {
    match timeout {
        None => provider.complete(request).await,
        Some(limit) => tokio::time::timeout(limit, provider.complete(request))
            .await
            .unwrap_or(Err(CompletionError::Timeout {
                timeout_ms: limit.as_millis() as u64,
            })),
    }
}
