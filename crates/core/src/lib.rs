//! # planloop core
//!
//! Domain types, traits, and error definitions for the planloop
//! plan/act/reflect agent. Every seam is a trait here: the completion
//! boundary ([`Provider`]) and tool capabilities ([`Tool`]). Implementations
//! live in their own crates, which makes the loop testable with scripted
//! stand-ins for the model.

pub mod agent;
pub mod error;
pub mod event;
pub mod provider;
pub mod tool;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use agent::{LoopState, LoopStatus, PlanFormat};
pub use error::{CompletionError, Error, LoopError, Result, Stage, ToolError};
pub use event::{EventBus, LoopEvent};
pub use provider::{Completion, CompletionOptions, CompletionRequest, Provider, Usage};
pub use tool::{ParamKind, Tool, ToolArgs, ToolDefinition, ToolDescription, ToolParameter, ToolRegistry};
pub use transcript::{ActionOutcome, ActionResult, Transcript, TranscriptEntry};
