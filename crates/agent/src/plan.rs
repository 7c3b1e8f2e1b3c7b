//! Plan parsing: turning model text into tool invocations.
//!
//! Two contracts are understood:
//!
//! - **Structured records**: JSON objects such as
//!   `{"tool": "get_weather", "args": {"city": "Paris"}}`. Also accepted are
//!   `{"name": ..., "arguments": ...}` (with `arguments` either an object or
//!   a JSON string), arrays of records, and `{"actions": [...]}`. Records may
//!   sit anywhere in the text, inside `<tool_call>` tags or code fences;
//!   they are found by bracket matching.
//! - **Mentions**: every registered tool whose name appears as a substring of
//!   the plan is invoked once with empty arguments, ordered by first
//!   occurrence. This is plain containment, so a tool called `greet` also
//!   matches the word "greeting".

use planloop_core::{PlanFormat, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tool call extracted from a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }
}

/// A plan as returned by the model plus the invocations found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub text: String,
    pub invocations: Vec<ToolInvocation>,
}

/// Parse `text` into a [`Plan`] according to `format`.
pub fn parse_plan(text: &str, registry: &ToolRegistry, format: PlanFormat) -> Plan {
    let invocations = match format {
        PlanFormat::Mentions => mention_invocations(text, registry),
        PlanFormat::Structured => structured_invocations(text),
        PlanFormat::Auto => {
            let structured = structured_invocations(text);
            if structured.is_empty() {
                mention_invocations(text, registry)
            } else {
                structured
            }
        }
    };

    Plan {
        text: text.to_string(),
        invocations,
    }
}

/// Registered tool names found in `text`, ordered by first occurrence.
pub fn mention_invocations(text: &str, registry: &ToolRegistry) -> Vec<ToolInvocation> {
    let mut found: Vec<(usize, &str)> = registry
        .names()
        .filter_map(|name| text.find(name).map(|pos| (pos, name)))
        .collect();
    // Stable: ties keep registration order
    found.sort_by_key(|(pos, _)| *pos);

    found
        .into_iter()
        .map(|(_, name)| ToolInvocation::new(name, Value::Object(Default::default())))
        .collect()
}

/// Every tool-call record embedded in `text`, in order of appearance.
pub fn structured_invocations(text: &str) -> Vec<ToolInvocation> {
    extract_json_values(text)
        .iter()
        .flat_map(records_from_value)
        .collect()
}

fn records_from_value(value: &Value) -> Vec<ToolInvocation> {
    match value {
        Value::Array(items) => items.iter().flat_map(records_from_value).collect(),
        Value::Object(map) => {
            if let Some(Value::Array(actions)) = map.get("actions") {
                return actions.iter().flat_map(records_from_value).collect();
            }
            record_from_object(map).into_iter().collect()
        }
        _ => Vec::new(),
    }
}

fn record_from_object(map: &serde_json::Map<String, Value>) -> Option<ToolInvocation> {
    let tool = map
        .get("tool")
        .or_else(|| map.get("name"))
        .and_then(Value::as_str)?
        .trim();
    if tool.is_empty() {
        return None;
    }

    let arguments = match map.get("args").or_else(|| map.get("arguments")) {
        None | Some(Value::Null) => Value::Object(Default::default()),
        // OpenAI-style stringified arguments
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        }
        Some(other) => other.clone(),
    };

    Some(ToolInvocation::new(tool, arguments))
}

/// Scan `text` for balanced `{...}` / `[...]` spans that parse as JSON.
///
/// A span that fails to parse is skipped one character at a time, so prose
/// such as "[1] call get_time" does not hide a record that follows it.
fn extract_json_values(text: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let Some(rel) = text[offset..].find(['{', '[']) else {
            break;
        };
        let start = offset + rel;
        match balanced_span(&text[start..]) {
            Some(span) => match serde_json::from_str::<Value>(span) {
                Ok(value) => {
                    values.push(value);
                    offset = start + span.len();
                }
                Err(_) => offset = start + 1,
            },
            None => offset = start + 1,
        }
    }

    values
}

/// The shortest prefix of `s` that closes the bracket `s` opens with.
/// Brackets inside JSON strings are ignored.
fn balanced_span(s: &str) -> Option<&str> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => stack.push(ch),
            '}' | ']' if !in_string => {
                let open = stack.pop()?;
                if (open == '{') != (ch == '}') {
                    return None;
                }
                if stack.is_empty() {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
