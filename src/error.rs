//! Error types for provisioning runs.

use std::io;

use thiserror::Error;

/// Errors that can occur while resolving input or talking to the billing API.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Bad, missing, or conflicting arguments. Raised before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Settings file or environment could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A required external program is not installed.
    #[error("Required program `{program}` was not found on PATH ({hint})")]
    DependencyMissing { program: String, hint: String },

    /// No usable credential could be obtained.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The billing API answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading the interactive prompt failed.
    #[error("Prompt error: {0}")]
    Prompt(#[from] io::Error),

    /// A fatal workflow step did not produce what later steps need.
    #[error("Step '{step}' failed: {reason}\nResponse: {raw}")]
    StepFailed {
        step: String,
        reason: String,
        raw: String,
    },
}

impl ProvisionError {
    /// Raw response body attached to this error, if the failure came from the API.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ProvisionError::Api { body, .. } => Some(body),
            ProvisionError::StepFailed { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Result type for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
