// SPDX-License-Identifier: MIT

//! Model module - defines the generation boundary and its implementations
//!
//! This module provides the core Model trait and shared request/response types.
//! Model implementations are in their own submodules:
//! - [gemini] - Google's Gemini API

pub mod gemini;

use crate::adk::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// Binary payload threaded into a multimodal prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPart {
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

/// Parts of a request - text or inline media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    /// Plain prompt text
    Text(String),
    /// Inline binary data (file or audio input)
    InlineData(MediaPart),
}

impl Part {
    pub fn text(t: impl Into<String>) -> Self {
        Part::Text(t.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(t) => Some(t),
            Part::InlineData(_) => None,
        }
    }
}

/// A single generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model_name: String,
    pub parts: Vec<Part>,
    pub system_instruction: Option<String>,
    /// Attach the provider's search tool
    #[serde(default)]
    pub use_search: bool,
    /// Extended reasoning budget; `Some(0)` disables it
    pub thinking_budget: Option<u32>,
}

/// The model's reply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
    pub grounding_metadata: Option<serde_json::Value>,
}

/// Core trait for generation service implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ModelError>;
}

/// Create a model for the given provider.
///
/// Provider resolution: explicit argument > `MODEL_PROVIDER` env > inferred from
/// the default model name.
pub fn create_model(
    provider: Option<&str>,
    default_model: &str,
) -> Result<Arc<dyn Model>, ModelError> {
    let provider = provider
        .map(str::to_string)
        .or_else(|| env::var("MODEL_PROVIDER").ok())
        .unwrap_or_else(|| infer_provider_from_model(default_model));

    log::debug!(
        "Using provider '{}' (default model '{}')",
        provider,
        default_model
    );

    match provider.as_str() {
        "Gemini" | "Google" | "gemini" | "google" | "" => {
            Ok(Arc::new(gemini::GeminiModel::from_env()?))
        }
        other => Err(ModelError::UnsupportedProvider(other.to_string())),
    }
}

/// Infer the provider name from a model identifier
pub fn infer_provider_from_model(model_name: &str) -> String {
    if model_name.starts_with("gpt") || model_name.starts_with("o1") {
        "OpenAI".to_string()
    } else if model_name.starts_with("claude") {
        "Anthropic".to_string()
    } else {
        "Gemini".to_string()
    }
}
