//! Shared HTTP plumbing for the built-in tools.

use std::time::Duration;

use parley_core::error::ToolError;
use tracing::{debug, warn};

/// Per-request timeout for upstream data services.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the client shared by every tool in a registry.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// GET `url` with `query` and return the decoded JSON body.
///
/// `service` labels network errors (e.g. "weather"); `status_label`
/// labels non-200 responses (e.g. "Weather").
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
    service: &str,
    status_label: &str,
) -> Result<serde_json::Value, ToolError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| ToolError::Network {
            service: service.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status().as_u16();
    debug!(service, status, "Upstream response");

    if status != 200 {
        let body = response.text().await.unwrap_or_default();
        return Err(ToolError::UpstreamStatus {
            service: status_label.to_string(),
            status,
            body,
        });
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| ToolError::MalformedResponse {
            service: service.to_string(),
            reason: e.to_string(),
        })
}
