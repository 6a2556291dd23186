//! Language-model providers for Parley.
//!
//! All providers implement the `parley_core::Provider` trait.

pub mod openai_compat;

use std::sync::Arc;

use parley_config::AppConfig;
use parley_core::Provider;
use tracing::{info, warn};

pub use openai_compat::OpenAiCompatProvider;

/// Build the provider described by the configuration.
///
/// A missing API key still yields a provider; requests then fail with an
/// authentication error, which the router turns into an apology.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    let api_key = config.api_key.clone().unwrap_or_else(|| {
        warn!("No language-model API key configured");
        String::new()
    });

    let name = if config.provider_url.contains("mistral.ai") {
        "mistral"
    } else {
        "openai-compat"
    };

    info!(provider = name, url = %config.provider_url, model = %config.model, "Provider configured");
    Arc::new(OpenAiCompatProvider::new(name, &config.provider_url, api_key))
}
