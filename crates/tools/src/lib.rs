//! Built-in tool implementations for planloop.
//!
//! The shipped tools are deterministic stubs: a clock, mock weather, an
//! e-mail outbox and a greeter. Real capabilities are supplied by the
//! embedding application, either as `Tool` impls or as closures wrapped in
//! [`FnTool`].

pub mod email;
pub mod function;
pub mod greet;
pub mod time;
pub mod weather;

use planloop_core::error::ToolError;
use planloop_core::tool::ToolRegistry;

pub use email::{EmailTool, Outbox, SentEmail};
pub use function::FnTool;
pub use greet::GreetTool;
pub use time::{Clock, TimeTool};
pub use weather::WeatherTool;

/// Create a registry holding every built-in stub tool.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(TimeTool::new()))?;
    registry.register(Box::new(WeatherTool))?;
    registry.register(Box::new(EmailTool::new()))?;
    registry.register(Box::new(GreetTool))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_order() {
        let registry = default_registry().unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["get_time", "get_weather", "send_email", "greet"]);
    }

    #[test]
    fn describe_all_lines() {
        let registry = default_registry().unwrap();
        let first = registry.describe_all().next().unwrap();
        assert_eq!(first.name, "get_time");
        assert!(first.to_string().starts_with("get_time: "));
    }

    #[test]
    fn second_stub_with_same_name_is_rejected() {
        let mut registry = default_registry().unwrap();
        let err = registry.register(Box::new(GreetTool)).unwrap_err();
        assert_eq!(err, ToolError::DuplicateTool("greet".into()));
        assert_eq!(registry.len(), 4);
    }
}
