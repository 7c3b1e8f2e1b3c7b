//! Weather tool: stub that returns mock weather data.
//!
//! A real deployment would call a weather API. The stub returns plausible,
//! deterministic data so the loop can be exercised end-to-end without
//! network access.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::{ParamKind, Tool, ToolArgs, ToolParameter, str_arg};

pub const DEFAULT_CITY: &str = "Paris";

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a city. Returns temperature and conditions."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::optional("city", ParamKind::String, "The city to look up")
                .with_default(DEFAULT_CITY),
            ToolParameter::optional(
                "units",
                ParamKind::String,
                "Temperature units: metric or imperial",
            )
            .with_default("metric"),
        ]
    }

    async fn execute(&self, arguments: &ToolArgs) -> Result<String, ToolError> {
        let city = str_arg(self.name(), arguments, "city")?.trim();
        if city.is_empty() {
            return Err(ToolError::invalid_arguments(self.name(), "city must not be empty"));
        }

        let units = str_arg(self.name(), arguments, "units")?;
        let imperial = match units {
            "metric" => false,
            "imperial" => true,
            other => {
                return Err(ToolError::invalid_arguments(
                    self.name(),
                    format!("unknown units '{other}'"),
                ));
            }
        };

        let report = mock_weather(city);
        let (temperature, unit_label) = if imperial {
            (report.celsius * 9.0 / 5.0 + 32.0, "°F")
        } else {
            (report.celsius, "°C")
        };

        Ok(format!(
            "{}: {}{}, {}",
            city,
            (temperature * 10.0).round() / 10.0,
            unit_label,
            report.conditions
        ))
    }
}

struct WeatherReport {
    celsius: f64,
    conditions: &'static str,
}

/// Deterministic mock weather: a few fixed cities, a name hash for the rest.
fn mock_weather(city: &str) -> WeatherReport {
    let fixed = match city.to_ascii_lowercase().as_str() {
        "paris" => Some((19.0, "Cloudy")),
        "athens" => Some((27.0, "Sunny")),
        "london" => Some((14.0, "Light rain")),
        _ => None,
    };
    if let Some((celsius, conditions)) = fixed {
        return WeatherReport {
            celsius,
            conditions,
        };
    }

    let hash: u32 = city
        .to_ascii_lowercase()
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));

    let conditions_list = [
        "Clear skies",
        "Partly cloudy",
        "Overcast",
        "Light rain",
        "Heavy rain",
        "Thunderstorms",
        "Snow",
        "Foggy",
    ];

    WeatherReport {
        celsius: ((hash % 40) as f64) - 5.0, // -5 to 34°C
        conditions: conditions_list[(hash as usize / 7) % conditions_list.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planloop_core::ToolRegistry;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(WeatherTool)).unwrap();
        registry
    }

    #[tokio::test]
    async fn defaults_to_paris() {
        let output = registry().invoke("get_weather", json!({})).await.unwrap();
        assert_eq!(output, "Paris: 19°C, Cloudy");
    }

    #[tokio::test]
    async fn imperial_units() {
        let output = registry()
            .invoke("get_weather", json!({"city": "Paris", "units": "imperial"}))
            .await
            .unwrap();
        assert!(output.contains("66.2°F"));
    }

    #[tokio::test]
    async fn deterministic_results() {
        let registry = registry();
        let r1 = registry.invoke("get_weather", json!({"city": "Oslo"})).await.unwrap();
        let r2 = registry.invoke("get_weather", json!({"city": "Oslo"})).await.unwrap();
        assert_eq!(r1, r2);
        assert!(r1.starts_with("Oslo: "));
    }

    #[tokio::test]
    async fn bad_units_rejected() {
        let err = registry()
            .invoke("get_weather", json!({"units": "kelvin"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn non_string_city_rejected_before_execution() {
        let err = registry()
            .invoke("get_weather", json!({"city": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn tool_definition() {
        let def = WeatherTool.to_definition();
        assert_eq!(def.name, "get_weather");
        assert_eq!(def.parameters["properties"]["city"]["default"], "Paris");
    }
}
