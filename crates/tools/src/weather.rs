//! Current-conditions lookup backed by the OpenWeatherMap API.

use async_trait::async_trait;
use parley_core::error::ToolError;
use parley_core::tool::{ParamType, ParameterSchema, ParameterSpec, Tool, ToolParameters};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::http;

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Measurement system requested from the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
    Standard,
}

impl Units {
    /// Parse a units name; anything unrecognized falls back to metric.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("metric") => Self::Metric,
            Some("imperial") => Self::Imperial,
            Some("standard") => Self::Standard,
            Some(other) => {
                warn!(units = other, "Invalid units, defaulting to metric");
                Self::Metric
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    fn temperature_suffix(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Standard => "K",
        }
    }

    fn wind_suffix(&self) -> &'static str {
        match self {
            Self::Imperial => "mph",
            Self::Metric | Self::Standard => "m/s",
        }
    }
}

pub struct WeatherTool {
    api_key: Option<String>,
    api_url: String,
    client: reqwest::Client,
}

impl WeatherTool {
    pub fn new(api_key: Option<String>, api_url: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("Weather tool initialized without API key");
        }
        Self {
            api_key,
            api_url: api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: http::client(),
        }
    }

    /// Share an existing HTTP client instead of building one.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather information for a specified location"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::from([
            (
                "location".to_string(),
                ParameterSpec::required(
                    ParamType::String,
                    "The city name or location to get weather for (e.g., 'New York', 'London, UK')",
                ),
            ),
            (
                "units".to_string(),
                ParameterSpec::optional(
                    ParamType::String,
                    "Units of measurement. Options: 'metric' (Celsius), 'imperial' (Fahrenheit), 'standard' (Kelvin)",
                ),
            ),
        ])
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<Value, ToolError> {
        let location = parameters
            .get("location")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Location is required".into()))?;

        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ToolError::MissingCredential {
                service: "Weather".into(),
            });
        };

        let units = Units::parse(parameters.get("units").and_then(Value::as_str));
        info!(location, units = units.as_str(), "Fetching weather");

        let url = format!("{}/weather", self.api_url);
        let data = http::get_json(
            &self.client,
            &url,
            &[("q", location), ("units", units.as_str()), ("appid", api_key)],
            "weather",
            "Weather",
        )
        .await?;
        debug!(response = %data, "Weather API response");

        shape_weather(&data, units)
    }
}

/// Reduce an OpenWeatherMap `/weather` response to the fields we report.
pub fn shape_weather(data: &Value, units: Units) -> Result<Value, ToolError> {
    let temp_unit = units.temperature_suffix();

    let name = string_at(data, "/name")?;
    let country = data
        .pointer("/sys/country")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(json!({
        "location": format!("{name}, {country}"),
        "temperature": format!("{}{temp_unit}", number_at(data, "/main/temp")?),
        "feels_like": format!("{}{temp_unit}", number_at(data, "/main/feels_like")?),
        "condition": string_at(data, "/weather/0/main")?,
        "description": string_at(data, "/weather/0/description")?,
        "humidity": format!("{}%", number_at(data, "/main/humidity")?),
        "wind_speed": format!("{} {}", number_at(data, "/wind/speed")?, units.wind_suffix()),
        "pressure": format!("{} hPa", number_at(data, "/main/pressure")?),
        "timestamp": number_at(data, "/dt")?,
    }))
}

fn missing(pointer: &str) -> ToolError {
    ToolError::MalformedResponse {
        service: "weather".into(),
        reason: format!("missing key: {}", pointer.trim_start_matches('/').replace('/', ".")),
    }
}

fn string_at<'a>(data: &'a Value, pointer: &str) -> Result<&'a str, ToolError> {
    data.pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(pointer))
}

fn number_at<'a>(data: &'a Value, pointer: &str) -> Result<&'a Value, ToolError> {
    data.pointer(pointer)
        .filter(|v| v.is_number())
        .ok_or_else(|| missing(pointer))
}
