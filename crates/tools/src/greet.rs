use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::{ParamKind, Tool, ToolArgs, ToolParameter, str_arg};

pub struct GreetTool;

#[async_trait]
impl Tool for GreetTool {
    fn name(&self) -> &str {
        "greet"
    }

    fn description(&self) -> &str {
        "Greet a person by name."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "name",
            ParamKind::String,
            "Who to greet",
        )]
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        let name = str_arg(self.name(), arguments, "name")?.trim();
        Ok(format!("Hello, {name}!"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn greets_by_name() {
        let args = json!({"name": " Ada "});
        let output = GreetTool.execute(args.as_object().unwrap()).await.unwrap();
        assert_eq!(output, "Hello, Ada!");
    }
}
