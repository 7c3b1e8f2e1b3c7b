//! Loop status and per-run state types.

use serde::{Deserialize, Serialize};

use crate::transcript::Transcript;

/// Where a run currently is in the plan/act/reflect cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    /// Asking the model for a plan (initial state)
    #[default]
    Planning,
    /// Executing the tool invocations found in the plan
    Acting,
    /// Asking the model whether the goal is met
    Reflecting,
    /// Terminal: the goal was judged complete
    Done,
    /// Terminal: an unrecoverable error ended the run
    Failed,
}

impl LoopStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Planning => "planning",
            Self::Acting => "acting",
            Self::Reflecting => "reflecting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How tool invocations are extracted from a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanFormat {
    /// Structured records when present, otherwise tool-name mentions
    #[default]
    Auto,
    /// Every registered tool name found as a substring of the plan text
    Mentions,
    /// JSON `{"tool": ..., "args": {...}}` records only
    Structured,
}

impl std::fmt::Display for PlanFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Mentions => "mentions",
            Self::Structured => "structured",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for PlanFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "mentions" => Ok(Self::Mentions),
            "structured" => Ok(Self::Structured),
            other => Err(format!(
                "unknown plan format '{other}' (expected auto, mentions or structured)"
            )),
        }
    }
}

/// The live state of exactly one run. Never shared between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopState {
    pub goal: String,
    pub transcript: Transcript,
    /// Iterations started so far (1-based once the first plan is requested)
    pub iteration: u32,
    /// How many times the run entered Planning, including a final entry
    /// that was refused by the iteration cap.
    pub planning_entries: u32,
    pub status: LoopStatus,
}

impl LoopState {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            transcript: Transcript::new(),
            iteration: 0,
            planning_entries: 0,
            status: LoopStatus::Planning,
        }
    }
}
