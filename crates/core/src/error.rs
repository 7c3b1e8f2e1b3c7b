//! Error types for the planloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps the ones a
//! caller meets while assembling a run (provider, tools, script files).

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for setting up planloop runs.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion boundary errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Script files ---
    #[error("Cannot load script {}: {reason}", path.display())]
    Script { path: PathBuf, reason: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the text-completion boundary (network, quota, malformed response).
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Completion timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Scripted provider exhausted after {calls} calls")]
    ScriptExhausted { calls: usize },
}

/// Registry and dispatch failures.
///
/// These never terminate a loop run: the loop folds their text into the
/// aggregate result handed to the reflection step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Duplicate tool registration: {0}")]
    DuplicateTool(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },
}

impl ToolError {
    /// Shorthand for an execution failure, used by tool implementations.
    pub fn execution(tool_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for an argument failure.
    pub fn invalid_arguments(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }
}

/// Which model call of the loop a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Planning,
    Acting,
    Reflecting,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planning => write!(f, "planning"),
            Self::Acting => write!(f, "acting"),
            Self::Reflecting => write!(f, "reflecting"),
        }
    }
}

/// Unrecoverable loop failures. Each one terminates the run in `Failed`.
#[derive(Debug, Clone, Error)]
pub enum LoopError {
    #[error("Completion failed during {stage} after {attempts} attempt(s): {source}")]
    Completion {
        stage: Stage,
        attempts: u32,
        #[source]
        source: CompletionError,
    },

    #[error("Iteration limit exceeded: {max_iterations} iteration(s) without completion")]
    IterationLimitExceeded { max_iterations: u32 },

    #[error("Run cancelled during {stage}")]
    Cancelled { stage: Stage },
}

impl LoopError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Completion {
                source: CompletionError::Timeout { .. },
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_displays_correctly() {
        let err = Error::Completion(CompletionError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::invalid_arguments("get_weather", "missing 'city'"));
        assert!(err.to_string().contains("get_weather"));
        assert!(err.to_string().contains("missing 'city'"));
    }

    #[test]
    fn script_error_names_the_file() {
        let err = Error::Script {
            path: PathBuf::from("/tmp/plan.txt"),
            reason: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot load script /tmp/plan.txt: permission denied"
        );
    }

    #[test]
    fn loop_error_keeps_completion_source() {
        let err = LoopError::Completion {
            stage: Stage::Reflecting,
            attempts: 3,
            source: CompletionError::Timeout { timeout_ms: 500 },
        };
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("reflecting"));
        assert!(err.to_string().contains("3 attempt"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("500ms"));
    }

    #[test]
    fn cancelled_is_detected() {
        let err = LoopError::Cancelled {
            stage: Stage::Acting,
        };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "Run cancelled during acting");
    }
}
