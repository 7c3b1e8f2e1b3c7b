//! How a finished run is shown to the user.

use planloop_agent::{RunFailure, RunReport};
use std::fmt::Write;

/// What a run hands back to the CLI.
pub type RunOutcome = Result<RunReport, RunFailure>;

/// Process exit status: 0 when the goal was reached, 1 otherwise.
pub fn exit_code(outcome: &RunOutcome) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// The transcript followed by a one-line status.
pub fn render_text(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    match outcome {
        Ok(report) => {
            out.push_str(&report.transcript.render());
            let _ = writeln!(
                out,
                "Status: {} ({} iteration{})",
                report.status,
                report.iterations,
                if report.iterations == 1 { "" } else { "s" }
            );
        }
        Err(failure) => {
            out.push_str(&failure.state.transcript.render());
            let _ = writeln!(out, "Status: {}: {}", failure.state.status, failure.error);
        }
    }
    out
}

/// Summary printed by `run --json`.
pub fn json_summary(outcome: &RunOutcome) -> serde_json::Value {
    match outcome {
        Ok(report) => serde_json::json!({
            "status": report.status,
            "goal": report.goal,
            "iterations": report.iterations,
            "transcript": report.transcript,
        }),
        Err(failure) => serde_json::json!({
            "status": failure.state.status,
            "goal": failure.state.goal,
            "iterations": failure.state.iteration,
            "transcript": failure.state.transcript,
            "error": failure.error.to_string(),
        }),
    }
}
