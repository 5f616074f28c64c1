// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{GenerateRequest, GenerateResponse, Model, Part};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::env;

const PROVIDER: &str = "gemini";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create a GeminiModel from the environment
    ///
    /// Requires `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) to be set.
    pub fn from_env() -> Result<Self, ModelError> {
        let api_key = env::var("GOOGLE_API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .map_err(|_| ModelError::ApiKeyMissing("Gemini".to_string()))?;
        Ok(Self::new(api_key))
    }

    /// Point the model at a different endpoint (proxies, local fakes)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model_name, self.api_key
        );

        let body = build_request_body(request);
        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = resp.text().await?;
            return Err(classify_error(status, &text, retry_after));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        parse_response(&resp_json)
    }
}

/// Serialize a request into the Gemini `generateContent` body
pub fn build_request_body(request: &GenerateRequest) -> Value {
    let parts: Vec<Value> = request.parts.iter().map(part_to_gemini_json).collect();

    let mut body = json!({
        "contents": [{ "role": "user", "parts": parts }]
    });

    if let Some(instruction) = request
        .system_instruction
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
    }

    if request.use_search {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }

    if let Some(budget) = request.thinking_budget {
        body["generationConfig"] = json!({
            "thinkingConfig": { "thinkingBudget": budget }
        });
    }

    body
}

/// Serialize a Part to Gemini API JSON format
pub fn part_to_gemini_json(part: &Part) -> Value {
    match part {
        Part::Text(t) => json!({ "text": t }),
        Part::InlineData(media) => json!({
            "inlineData": { "mimeType": media.mime_type, "data": media.data }
        }),
    }
}

/// Map a failed HTTP response onto a ModelError
pub fn classify_error(status: StatusCode, body: &str, retry_after_secs: Option<u64>) -> ModelError {
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
        return ModelError::RateLimited {
            retry_after_secs,
            message: body.to_string(),
        };
    }
    ModelError::api(PROVIDER, status.as_u16(), body)
}

/// Parse a `generateContent` response into text plus grounding metadata
pub fn parse_response(resp_json: &Value) -> Result<GenerateResponse, ModelError> {
    let candidate = resp_json["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| {
            let reason = resp_json["promptFeedback"]["blockReason"]
                .as_str()
                .map(|r| format!("prompt blocked: {}", r))
                .unwrap_or_else(|| "no candidates in response".to_string());
            ModelError::InvalidResponse(reason)
        })?;

    if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
        log::debug!("Gemini finish reason: {}", finish_reason);
        if finish_reason == "SAFETY" {
            return Err(ModelError::InvalidResponse(
                "Gemini blocked response due to safety filters.".to_string(),
            ));
        }
    }

    let text = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p["thought"].as_bool().unwrap_or(false))
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();

    let grounding_metadata = candidate
        .get("groundingMetadata")
        .filter(|v| !v.is_null())
        .cloned();

    Ok(GenerateResponse {
        text,
        grounding_metadata,
    })
}
