// SPDX-License-Identifier: MIT

//! Typed error handling for flowline-rs
//!
//! `FlowlineError` is the top-level error; `WorkflowError` and `ModelError`
//! cover the workflow engine and the model boundary respectively.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for flowline-rs
#[derive(Debug, Error)]
pub enum FlowlineError {
    /// Errors raised by the model boundary
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Tool not found during execution
    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },

    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workflow-specific errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper for compatibility
    #[error("{0}")]
    Other(String),
}

/// Workflow-specific errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkflowError {
    /// Two nodes share the same id
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    /// Node lookup failed
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Edge references a node that is not part of the workflow
    #[error("Edge '{edge}' references unknown node '{node}'")]
    DanglingEdge { edge: String, node: String },

    /// Node configuration failed validation
    #[error("Invalid configuration for node '{node}': {reason}")]
    InvalidNode { node: String, reason: String },

    /// Workflow file not found when loading
    #[error("Workflow file not found: {0}")]
    FileNotFound(String),

    /// A run is already active on this session
    #[error("A workflow run is already in progress")]
    RunInProgress,

    /// The run was cancelled before it finished
    #[error("Workflow run was cancelled")]
    Cancelled,
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Provider not supported
    #[error("Model provider not supported: {0}")]
    UnsupportedProvider(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds: {message}")]
    RateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    /// Non-success HTTP status from the provider
    #[error("API error from {provider} (status {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// No response within the configured timeout
    #[error(
        "Request timed out after {}. The model may be overloaded; try again or raise the timeout.",
        timeout_span(.0)
    )]
    Timeout(Duration),

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// HTTP transport errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Failure raised by a non-HTTP model implementation
    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a rate limit error without a retry hint
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            retry_after_secs: None,
            message: message.into(),
        }
    }

    /// Whether the error signals a rate limit or exhausted quota.
    ///
    /// Only these are retried by the generation client.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api {
                status, message, ..
            } => *status == 429 || message.contains("RESOURCE_EXHAUSTED"),
            Self::Other(message) => {
                message.contains("429") || message.contains("RESOURCE_EXHAUSTED")
            }
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl FlowlineError {
    /// Create a tool not found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Whole seconds, or milliseconds below one second
fn timeout_span(d: &Duration) -> String {
    if d.as_secs() == 0 {
        format!("{} ms", d.as_millis())
    } else {
        format!("{} seconds", d.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        assert!(ModelError::rate_limited("quota").is_rate_limit());
        assert!(ModelError::api("gemini", 429, "slow down").is_rate_limit());
        assert!(ModelError::api("gemini", 400, "status: RESOURCE_EXHAUSTED").is_rate_limit());
        assert!(ModelError::Other("HTTP 429 Too Many Requests".into()).is_rate_limit());

        assert!(!ModelError::api("gemini", 500, "internal").is_rate_limit());
        assert!(!ModelError::Timeout(Duration::from_secs(1)).is_rate_limit());
        assert!(!ModelError::Cancelled.is_rate_limit());
    }

    #[test]
    fn test_timeout_message_is_distinct() {
        let err = ModelError::Timeout(Duration::from_secs(240));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out after 240 seconds"));

        let short = ModelError::Timeout(Duration::from_millis(250));
        assert!(short.to_string().contains("timed out after 250 ms"));
    }

    #[test]
    fn test_workflow_error_wraps() {
        let err: FlowlineError = WorkflowError::RunInProgress.into();
        assert_eq!(
            err.to_string(),
            "Workflow error: A workflow run is already in progress"
        );
    }
}
