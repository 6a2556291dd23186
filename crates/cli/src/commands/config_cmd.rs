//! `parley config` — Show the effective configuration.

use std::path::Path;

use parley_config::AppConfig;

const REDACTED: &str = "********";

pub fn show(config: &AppConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("# {}", path.display());
    if !path.exists() {
        println!("# (file not found, showing defaults and environment overrides)");
    }
    println!();
    println!("{}", toml::to_string_pretty(&redacted(config))?);

    let missing = config.missing_credentials();
    if missing.is_empty() {
        println!("All API keys are configured.");
    } else {
        println!("Missing API keys: {}", missing.join(", "));
    }
    Ok(())
}

/// A copy of `config` with every secret masked.
fn redacted(config: &AppConfig) -> AppConfig {
    let mask = |key: &Option<String>| key.as_ref().map(|_| REDACTED.to_string());

    let mut shown = config.clone();
    shown.api_key = mask(&config.api_key);
    shown.tools.weather.api_key = mask(&config.tools.weather.api_key);
    shown.tools.stock.api_key = mask(&config.tools.stock.api_key);
    shown
}
