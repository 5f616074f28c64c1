// SPDX-License-Identifier: MIT

//! Generation client - the single request/response boundary used by Agent nodes
//!
//! Wraps a [`Model`] with a per-call timeout, cancellation, and exponential
//! backoff for rate-limited responses. Failures are reported in the returned
//! [`GenerationResult`] instead of as `Err`.

use crate::adk::error::ModelError;
use crate::adk::model::{GenerateRequest, Model};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Backoff policy for rate-limited calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exp)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(2_000))
    }
}

/// Per-call limits applied by the client
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of a generation call; `error` is set on failure and `text` is empty
#[derive(Debug, Default)]
pub struct GenerationResult {
    pub text: String,
    pub error: Option<ModelError>,
    pub grounding_metadata: Option<Value>,
    /// Number of model invocations made, including retries
    pub attempts: u32,
}

impl GenerationResult {
    fn failure(error: ModelError, attempts: u32) -> Self {
        Self {
            text: String::new(),
            error: Some(error),
            grounding_metadata: None,
            attempts,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Invokes the generation service for one node at a time
#[derive(Clone)]
pub struct GenerationClient {
    model: Arc<dyn Model>,
    options: GenerationOptions,
}

impl GenerationClient {
    pub fn new(model: Arc<dyn Model>, options: GenerationOptions) -> Self {
        Self { model, options }
    }

    /// Generate with the client's configured options
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        self.generate_with(request, self.options, cancel).await
    }

    /// Generate with explicit timeout and retry limits
    pub async fn generate_with(
        &self,
        request: &GenerateRequest,
        options: GenerationOptions,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match self.attempt(request, options.timeout, cancel).await {
                Ok(resp) => {
                    return GenerationResult {
                        text: resp.text,
                        error: None,
                        grounding_metadata: resp.grounding_metadata,
                        attempts: attempt,
                    };
                }
                Err(e) if e.is_rate_limit() && attempt <= options.retry.max_retries => {
                    let delay = options.retry.delay_for(attempt);
                    log::warn!(
                        "Rate limited on {} (retry {}/{}), backing off {}ms: {}",
                        request.model_name,
                        attempt,
                        options.retry.max_retries,
                        delay.as_millis(),
                        e
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return GenerationResult::failure(ModelError::Cancelled, attempt);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => {
                    log::error!(
                        "Generation failed on {} after {} attempt(s): {}",
                        request.model_name,
                        attempt,
                        e
                    );
                    return GenerationResult::failure(e, attempt);
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &GenerateRequest,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<crate::adk::model::GenerateResponse, ModelError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ModelError::Cancelled),
            res = tokio::time::timeout(timeout, self.model.generate(request)) => {
                res.unwrap_or_else(|_| Err(ModelError::Timeout(timeout)))
            }
        }
    }
}
