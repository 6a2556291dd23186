//! Built-in capabilities for Parley.
//!
//! Each capability reaches one external data service and reduces its
//! response to a small JSON payload the model can phrase an answer from.

mod http;
pub mod stock;
pub mod weather;

use parley_config::AppConfig;
use parley_core::tool::ToolRegistry;

pub use stock::StockTool;
pub use weather::{Units, WeatherTool};

/// Create the registry of built-in tools described by the configuration.
///
/// Tools without credentials are still registered; invoking them yields a
/// "missing API key" failure payload.
pub fn default_registry(config: &AppConfig) -> ToolRegistry {
    let client = http::client();
    let weather = &config.tools.weather;
    let stock = &config.tools.stock;

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(
        WeatherTool::new(weather.api_key.clone(), weather.api_url.clone())
            .with_client(client.clone()),
    ));
    registry.register(Box::new(
        StockTool::new(stock.api_key.clone(), stock.api_url.clone()).with_client(client),
    ));
    registry
}
