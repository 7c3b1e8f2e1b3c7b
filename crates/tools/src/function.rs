//! Closure-backed tools.
//!
//! `FnTool` lets a caller register an ad hoc capability without writing a
//! struct and trait impl:
//!
//! ```
//! use planloop_core::tool::{ParamKind, ToolParameter};
//! use planloop_tools::FnTool;
//!
//! let shout = FnTool::new("shout", "Upper-case some text", |args| {
//!     let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
//!     Ok(text.to_uppercase())
//! })
//! .with_parameter(ToolParameter::required("text", ParamKind::String, "Text to shout"));
//! # let _ = shout;
//! ```

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::{Tool, ToolArgs, ToolParameter};

type Handler = dyn Fn(&ToolArgs) -> Result<String, ToolError> + Send + Sync;

pub struct FnTool {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
    handler: Box<Handler>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ToolArgs) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            handler: Box::new(handler),
        }
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        self.parameters.clone()
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        (self.handler)(arguments)
    }
}
