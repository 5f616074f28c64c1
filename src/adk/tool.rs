// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;

/// Trait for tools that Tool nodes can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (must be unique within a registry)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Execute the tool with `{"input": <interpolated text>}` and return the result
    async fn execute(&self, input: Value) -> Result<Value, Box<dyn Error + Send + Sync>>;
}
