//! Error types for the Parley domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures a capability can report.
///
/// None of these abort a routing cycle: [`crate::tool::run_tool`] turns every
/// variant into a structured `{error, details}` payload.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{service} API key is missing")]
    MissingCredential { service: String },

    #[error("Network error connecting to {service} API: {reason}")]
    Network { service: String, reason: String },

    #[error("{service} API error: {status}")]
    UpstreamStatus {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected data format from {service} API: {reason}")]
    MalformedResponse { service: String, reason: String },

    #[error("{message}")]
    NoData { message: String, details: String },
}

impl ToolError {
    /// The `details` half of the structured failure payload.
    pub fn details(&self) -> String {
        match self {
            Self::NotFound(name) => format!("No tool named '{name}' is registered"),
            Self::InvalidArguments(reason) => reason.clone(),
            Self::MissingCredential { service } => {
                format!("Please provide a valid {service} API key in the configuration")
            }
            Self::Network { reason, .. } => reason.clone(),
            Self::UpstreamStatus { body, .. } => body.clone(),
            Self::MalformedResponse { reason, .. } => reason.clone(),
            Self::NoData { details, .. } => details.clone(),
        }
    }
}
