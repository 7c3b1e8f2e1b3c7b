//! Prompt templates for the planning and reflection calls.

use planloop_core::{PlanFormat, ToolRegistry, Transcript};
use std::fmt::Write;

/// Build the planning prompt from the goal, the tools and prior iterations.
pub fn plan_prompt(
    goal: &str,
    registry: &ToolRegistry,
    format: PlanFormat,
    transcript: &Transcript,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "You are an autonomous agent. Your goal is: {goal}");
    prompt.push_str("Break this into a short step-by-step plan using available tools:\n");
    for tool in registry.describe_all() {
        let _ = writeln!(prompt, "- {tool}");
    }

    match format {
        PlanFormat::Mentions => {
            prompt.push_str("\nReturn the plan as plain text steps, naming each tool you will use.\n");
        }
        PlanFormat::Structured | PlanFormat::Auto => {
            prompt.push_str(
                "\nReturn the plan as plain text steps. For every tool you want to run, \
                 include a JSON record on its own line:\n\
                 {\"tool\": \"<tool name>\", \"args\": {<arguments>}}\n",
            );
            prompt.push_str("\nTool parameters (JSON Schema):\n");
            for definition in registry.definitions() {
                let _ = writeln!(prompt, "- {}: {}", definition.name, definition.parameters);
            }
        }
    }

    if !transcript.is_empty() {
        prompt.push_str("\nPrevious iterations did not complete the goal:\n\n");
        prompt.push_str(&transcript.render());
        prompt.push_str("Plan the next steps.\n");
    }

    prompt
}

/// Build the reflection prompt asking whether the goal is met.
pub fn reflection_prompt(goal: &str, aggregate: &str, completion_marker: &str) -> String {
    format!(
        "You executed the following plan and got the result:\n{aggregate}\n\n\
         Did you accomplish the goal: \"{goal}\"?\n\
         Reply with {completion_marker} if complete or NO if more steps are needed."
    )
}

/// Case-insensitive containment check for the completion marker.
pub fn is_complete(reflection: &str, completion_marker: &str) -> bool {
    reflection
        .to_uppercase()
        .contains(&completion_marker.to_uppercase())
}
