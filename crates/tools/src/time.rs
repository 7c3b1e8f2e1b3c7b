//! Clock tool: reports the current local time as `HH:MM:SS`.

use async_trait::async_trait;
use chrono::{Local, NaiveTime};
use planloop_core::error::ToolError;
use planloop_core::tool::{Tool, ToolArgs};

/// Where the time comes from.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    Local,
    /// Always reports the same time; keeps transcripts reproducible.
    Fixed(NaiveTime),
}

impl Clock {
    fn now(&self) -> NaiveTime {
        match self {
            Self::Local => Local::now().time(),
            Self::Fixed(time) => *time,
        }
    }
}

pub struct TimeTool {
    clock: Clock,
}

impl TimeTool {
    pub fn new() -> Self {
        Self {
            clock: Clock::Local,
        }
    }

    pub fn fixed(time: NaiveTime) -> Self {
        Self {
            clock: Clock::Fixed(time),
        }
    }
}

impl Default for TimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for TimeTool {
    fn name(&self) -> &str {
        "get_time"
    }

    fn description(&self) -> &str {
        "Get the current local time (HH:MM:SS). Takes no arguments."
    }

    async fn execute(&self, _arguments: &ToolArgs) -> Result<String, ToolError> {
        Ok(self.clock.now().format("%H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_clock() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let tool = TimeTool::fixed(noon);
        assert_eq!(tool.execute(&ToolArgs::new()).await.unwrap(), "12:00:00");
    }

    #[tokio::test]
    async fn local_clock_format() {
        let output = TimeTool::new().execute(&ToolArgs::new()).await.unwrap();
        assert!(NaiveTime::parse_from_str(&output, "%H:%M:%S").is_ok());
    }

    #[test]
    fn takes_no_parameters() {
        let def = TimeTool::new().to_definition();
        assert_eq!(def.name, "get_time");
        assert!(def.parameters["properties"].as_object().unwrap().is_empty());
    }
}
