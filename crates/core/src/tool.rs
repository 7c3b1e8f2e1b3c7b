//! Tool trait and registry: the abstraction over agent capabilities.
//!
//! Tools are what give the loop the ability to act in the world: look up
//! the weather, send a message, read the clock. They are supplied by the
//! caller, registered once at startup, and never mutated afterwards.

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ToolError;

/// Validated arguments handed to [`Tool::execute`].
pub type ToolArgs = serde_json::Map<String, Value>;

/// The JSON kind a tool parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    /// The JSON Schema `type` name for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Whether `value` is of this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// One named, typed parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Value used when the caller omits the parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ToolParameter {
    /// A parameter the caller must always supply.
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// A parameter the caller may omit.
    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Attach a default value, used when the parameter is missing.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A tool definition rendered for the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: Value,
}

/// A `name: description` pair produced by [`ToolRegistry::describe_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescription<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

impl std::fmt::Display for ToolDescription<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// The core Tool trait.
///
/// Implementations receive arguments that have already been validated
/// against [`Tool::parameters`] (required parameters present, kinds checked,
/// defaults filled in).
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (shown to the model).
    fn description(&self) -> &str;

    /// Ordered parameter list. Defaults to no parameters.
    fn parameters(&self) -> Vec<ToolParameter> {
        Vec::new()
    }

    /// Execute the tool with validated arguments.
    async fn execute(&self, arguments: &ToolArgs) -> std::result::Result<String, ToolError>;

    /// JSON Schema derived from [`Tool::parameters`].
    fn parameters_schema(&self) -> Value {
        let params = self.parameters();
        let mut properties = serde_json::Map::new();
        for p in &params {
            let mut prop = serde_json::json!({
                "type": p.kind.json_type(),
                "description": p.description,
            });
            if let Some(default) = &p.default {
                prop["default"] = default.clone();
            }
            properties.insert(p.name.clone(), prop);
        }
        let required: Vec<&str> = params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Convert this tool into a ToolDefinition for prompt rendering.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Fetch a string argument that validation guarantees is present.
pub fn str_arg<'a>(tool: &str, args: &'a ToolArgs, name: &str) -> std::result::Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::invalid_arguments(tool, format!("missing string argument '{name}'")))
}

/// A registry of available tools.
///
/// Registration order is preserved so that rendered prompts are
/// reproducible. Duplicate names are rejected; the first registration wins.
/// Once built, the registry is shared read-only (usually as
/// `Arc<ToolRegistry>`) between any number of loop runs.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Fails with [`ToolError::DuplicateTool`] if the name is taken.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        debug!(tool = %name, "Registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(Arc::from(tool));
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tools.iter().map(|t| t.name())
    }

    /// Lazily yield `name: description` pairs in registration order.
    pub fn describe_all(&self) -> impl Iterator<Item = ToolDescription<'_>> + '_ {
        self.tools.iter().map(|t| ToolDescription {
            name: t.name(),
            description: t.description(),
        })
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Check `arguments` against the tool's parameter list and fill defaults.
    pub fn validate_arguments(
        tool: &dyn Tool,
        arguments: Value,
    ) -> std::result::Result<ToolArgs, ToolError> {
        let mut args = match arguments {
            Value::Null => ToolArgs::new(),
            Value::Object(map) => map,
            other => {
                return Err(ToolError::invalid_arguments(
                    tool.name(),
                    format!("expected an object of arguments, got {other}"),
                ));
            }
        };

        for param in tool.parameters() {
            match args.get(&param.name) {
                Some(value) if !value.is_null() => {
                    if !param.kind.matches(value) {
                        return Err(ToolError::invalid_arguments(
                            tool.name(),
                            format!(
                                "argument '{}' must be of type {}, got {}",
                                param.name,
                                param.kind.json_type(),
                                value
                            ),
                        ));
                    }
                }
                _ => {
                    if let Some(default) = param.default {
                        args.insert(param.name, default);
                    } else if param.required {
                        return Err(ToolError::invalid_arguments(
                            tool.name(),
                            format!("missing required argument '{}'", param.name),
                        ));
                    }
                }
            }
        }

        Ok(args)
    }

    /// Look up, validate and execute a tool.
    ///
    /// Any failure inside the tool, including a panic, comes back as a
    /// [`ToolError`]; nothing unwinds into the caller.
    pub async fn invoke(&self, name: &str, arguments: Value) -> std::result::Result<String, ToolError> {
        let tool = self
            .index
            .get(name)
            .map(|&i| self.tools[i].clone())
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = Self::validate_arguments(tool.as_ref(), arguments)?;

        debug!(tool = %name, "Invoking tool");
        match AssertUnwindSafe(tool.execute(&args)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                warn!(tool = %name, error = %e, "Tool returned an error");
                Err(match e {
                    ToolError::InvalidArguments { .. }
                    | ToolError::ExecutionFailed { .. }
                    | ToolError::Timeout { .. } => e,
                    other => ToolError::execution(name, other),
                })
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "tool panicked".to_string());
                warn!(tool = %name, %reason, "Tool panicked");
                Err(ToolError::execution(name, format!("panicked: {reason}")))
            }
        }
    }

    /// [`invoke`](Self::invoke) bounded by an optional timeout.
    pub async fn invoke_with_timeout(
        &self,
        name: &str,
        arguments: Value,
        timeout: Option<Duration>,
    ) -> std::result::Result<String, ToolError> {
        let Some(limit) = timeout else {
            return self.invoke(name, arguments).await;
        };

        match tokio::time::timeout(limit, self.invoke(name, arguments)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(tool = %name, timeout_ms = limit.as_millis() as u64, "Tool timed out");
                Err(ToolError::Timeout {
                    tool_name: name.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                })
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> Vec<ToolParameter> {
            vec![
                ToolParameter::required("text", ParamKind::String, "Text to echo"),
                ToolParameter::optional("times", ParamKind::Integer, "Repeat count").with_default(1),
            ]
        }
        async fn execute(&self, arguments: &ToolArgs) -> std::result::Result<String, ToolError> {
            let text = str_arg(self.name, arguments, "text")?;
            let times = arguments["times"].as_u64().unwrap_or(1) as usize;
            Ok(text.repeat(times))
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "explode"
        }
        fn description(&self) -> &str {
            "Always panics"
        }
        async fn execute(&self, _arguments: &ToolArgs) -> std::result::Result<String, ToolError> {
            panic!("boom");
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }
        fn description(&self) -> &str {
            "Sleeps for an hour"
        }
        async fn execute(&self, _arguments: &ToolArgs) -> std::result::Result<String, ToolError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("finally".into())
        }
    }

    fn echo_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool { name: "echo" })).unwrap();
        registry
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = echo_registry();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_rejected_and_first_kept() {
        let mut registry = echo_registry();
        let err = registry
            .register(Box::new(EchoTool { name: "echo" }))
            .unwrap_err();
        assert_eq!(err, ToolError::DuplicateTool("echo".into()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("echo").unwrap().description(), "Echoes back the input");
    }

    #[test]
    fn describe_all_preserves_insertion_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(Box::new(EchoTool { name })).unwrap();
        }
        let rendered: Vec<String> = registry.describe_all().map(|d| d.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "zeta: Echoes back the input",
                "alpha: Echoes back the input",
                "mid: Echoes back the input",
            ]
        );
    }

    #[test]
    fn schema_lists_required_and_defaults() {
        let tool = EchoTool { name: "echo" };
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], serde_json::json!(["text"]));
        assert_eq!(schema["properties"]["times"]["type"], "integer");
        assert_eq!(schema["properties"]["times"]["default"], 1);
        assert_eq!(tool.to_definition().name, "echo");
    }

    #[tokio::test]
    async fn invoke_executes_with_defaults() {
        let registry = echo_registry();
        let out = registry
            .invoke("echo", serde_json::json!({"text": "hi"}))
            .await
            .unwrap();
        assert_eq!(out, "hi");

        let out = registry
            .invoke("echo", serde_json::json!({"text": "hi", "times": 3}))
            .await
            .unwrap();
        assert_eq!(out, "hihihi");
    }

    #[tokio::test]
    async fn invoke_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("nonexistent", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "nonexistent"));
    }

    #[tokio::test]
    async fn invoke_missing_required_argument() {
        let registry = echo_registry();
        let err = registry.invoke("echo", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref reason, .. } if reason.contains("text")));
    }

    #[tokio::test]
    async fn invoke_wrong_kind() {
        let registry = echo_registry();
        let err = registry
            .invoke("echo", serde_json::json!({"text": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let err = registry
            .invoke("echo", serde_json::json!(["not", "an", "object"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn panicking_tool_is_contained() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(PanickingTool)).unwrap();
        let err = registry.invoke("explode", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { ref reason, .. } if reason.contains("boom")));
    }

    #[tokio::test(start_paused = true)]
    async fn invoke_with_timeout_expires() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(SlowTool)).unwrap();
        let err = registry
            .invoke_with_timeout("slow", Value::Null, Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::Timeout {
                tool_name: "slow".into(),
                timeout_ms: 50
            }
        );
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ToolRegistry>();
    }
}
