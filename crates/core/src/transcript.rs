//! Transcript: the ordered record of one loop run.
//!
//! Entries are appended once per completed plan/act/reflect iteration and
//! never edited. Nothing in here is time- or randomness-dependent, so two
//! runs fed the same model responses serialize to identical bytes.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::error::ToolError;

/// How a single tool invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum ActionOutcome {
    Success(String),
    Failure(String),
}

/// One tool invocation attempt made during Acting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub tool: String,
    pub arguments: serde_json::Value,
    pub outcome: ActionOutcome,
}

impl ActionResult {
    pub fn from_result(
        tool: impl Into<String>,
        arguments: serde_json::Value,
        result: &std::result::Result<String, ToolError>,
    ) -> Self {
        let outcome = match result {
            Ok(output) => ActionOutcome::Success(output.clone()),
            Err(e) => ActionOutcome::Failure(e.to_string()),
        };
        Self {
            tool: tool.into(),
            arguments,
            outcome,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ActionOutcome::Success(_))
    }

    /// The line this action contributes to the aggregate result.
    pub fn summary_line(&self) -> String {
        match &self.outcome {
            ActionOutcome::Success(text) => format!("{}: {}", self.tool, text),
            ActionOutcome::Failure(error) => format!("{}: Error: {}", self.tool, error),
        }
    }
}

/// Text used as the aggregate result when a plan names no tools.
pub const NO_ACTIONS: &str = "(no tools were invoked)";

/// Fold a list of action results into the text handed to reflection.
pub fn aggregate(actions: &[ActionResult]) -> String {
    if actions.is_empty() {
        return NO_ACTIONS.to_string();
    }
    actions
        .iter()
        .map(ActionResult::summary_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One plan/act/reflect iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// 1-based iteration number
    pub iteration: u32,
    pub plan: String,
    pub actions: Vec<ActionResult>,
    pub aggregate: String,
    pub reflection: String,
}

/// Append-only sequence of iterations for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranscriptEntry> {
        self.entries.iter()
    }

    /// Render as plain text, for prompts and terminal output.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "## Iteration {}", entry.iteration);
            let _ = writeln!(out, "Plan:\n{}", entry.plan.trim());
            let _ = writeln!(out, "Result:\n{}", entry.aggregate.trim());
            let _ = writeln!(out, "Reflection:\n{}", entry.reflection.trim());
            out.push('\n');
        }
        out
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a TranscriptEntry;
    type IntoIter = std::slice::Iter<'a, TranscriptEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(iteration: u32) -> TranscriptEntry {
        let actions = vec![
            ActionResult::from_result("get_time", serde_json::json!({}), &Ok("12:00:00".into())),
            ActionResult::from_result(
                "get_weather",
                serde_json::json!({}),
                &Err(ToolError::UnknownTool("get_weather".into())),
            ),
        ];
        TranscriptEntry {
            iteration,
            plan: "Call get_time then get_weather".into(),
            aggregate: aggregate(&actions),
            actions,
            reflection: "NO".into(),
        }
    }

    #[test]
    fn aggregate_folds_successes_and_failures() {
        let e = entry(1);
        assert_eq!(
            e.aggregate,
            "get_time: 12:00:00\nget_weather: Error: Unknown tool: get_weather"
        );
        assert!(e.actions[0].succeeded());
        assert!(!e.actions[1].succeeded());
    }

    #[test]
    fn aggregate_of_nothing() {
        assert_eq!(aggregate(&[]), NO_ACTIONS);
    }

    #[test]
    fn transcript_appends_in_order() {
        let mut t = Transcript::new();
        assert!(t.is_empty());
        t.push(entry(1));
        t.push(entry(2));
        assert_eq!(t.len(), 2);
        let iterations: Vec<u32> = t.iter().map(|e| e.iteration).collect();
        assert_eq!(iterations, vec![1, 2]);
        assert_eq!(t.last().unwrap().iteration, 2);
    }

    #[test]
    fn render_contains_every_section() {
        let mut t = Transcript::new();
        t.push(entry(1));
        let text = t.render();
        assert!(text.contains("## Iteration 1"));
        assert!(text.contains("Plan:\nCall get_time"));
        assert!(text.contains("12:00:00"));
        assert!(text.contains("Reflection:\nNO"));
    }

    #[test]
    fn serialization_is_stable() {
        let mut a = Transcript::new();
        let mut b = Transcript::new();
        a.push(entry(1));
        b.push(entry(1));
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains(r#""status":"success""#));
    }
}
