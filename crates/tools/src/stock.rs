//! Stock quote lookup backed by the Alpha Vantage `GLOBAL_QUOTE` endpoint.

use std::str::FromStr;

use async_trait::async_trait;
use parley_core::error::ToolError;
use parley_core::tool::{ParamType, ParameterSchema, ParameterSpec, Tool, ToolParameters};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::http;

pub const DEFAULT_API_URL: &str = "https://www.alphavantage.co";

pub struct StockTool {
    api_key: Option<String>,
    api_url: String,
    client: reqwest::Client,
}

impl StockTool {
    pub fn new(api_key: Option<String>, api_url: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("Stock tool initialized without API key");
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
impl Tool for StockTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Get current stock price information for a specified ticker symbol"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::from([(
            "symbol".to_string(),
            ParameterSpec::required(
                ParamType::String,
                "The stock ticker symbol (e.g., 'AAPL' for Apple, 'MSFT' for Microsoft)",
            ),
        )])
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<Value, ToolError> {
        let symbol = parameters
            .get("symbol")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Stock symbol is required".into()))?;

        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ToolError::MissingCredential {
                service: "Alpha Vantage".into(),
            });
        };

        info!(symbol = %symbol, "Fetching stock price");

        let url = format!("{}/query", self.api_url);
        let data = http::get_json(
            &self.client,
            &url,
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol.as_str()),
                ("apikey", api_key),
            ],
            "stock",
            "Stock",
        )
        .await?;
        debug!(response = %data, "Stock API response");

        let mut shaped = shape_quote(&data, &symbol)?;
        shaped["fetched_at"] = json!(chrono::Utc::now().to_rfc3339());
        Ok(shaped)
    }
}

/// Reduce an Alpha Vantage quote response to the fields we report.
///
/// Absent quote fields take neutral defaults; present ones must parse.
pub fn shape_quote(data: &Value, symbol: &str) -> Result<Value, ToolError> {
    let quote = data
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ToolError::NoData {
            message: format!("No data found for symbol: {symbol}"),
            details: "The requested stock symbol may be invalid or not available".into(),
        })?;

    quote_payload(quote, symbol).map_err(|reason| ToolError::NoData {
        message: format!("Error parsing stock data: {reason}"),
        details: format!("Raw data: {}", Value::Object(quote.clone())),
    })
}

fn quote_payload(quote: &serde_json::Map<String, Value>, symbol: &str) -> Result<Value, String> {
    let text = |key: &str, default: &str| -> String {
        quote
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    Ok(json!({
        "symbol": text("01. symbol", symbol),
        "price": parse_field::<f64>(quote, "05. price")?,
        "change": parse_field::<f64>(quote, "09. change")?,
        "change_percent": text("10. change percent", "0%"),
        "volume": parse_field::<u64>(quote, "06. volume")?,
        "latest_trading_day": text("07. latest trading day", "N/A"),
        "previous_close": parse_field::<f64>(quote, "08. previous close")?,
    }))
}

fn parse_field<T>(quote: &serde_json::Map<String, Value>, key: &str) -> Result<T, String>
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    match quote.get(key) {
        None => Ok(T::default()),
        Some(Value::String(raw)) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{key}: {e} ({raw:?})")),
        Some(other) => other
            .to_string()
            .parse()
            .map_err(|e| format!("{key}: {e} ({other})")),
    }
}
