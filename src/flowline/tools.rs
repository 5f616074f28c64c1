// SPDX-License-Identifier: MIT

//! Built-in tools for Tool nodes
//!
//! Both wrap the structured extractor so a workflow can pull JSON or a
//! Mermaid diagram out of an earlier agent's reply.

use crate::adk::tool::Tool;
use crate::flowline::workflow::extract::{extract_fenced_code, extract_json};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;

pub fn builtin_tools() -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(ExtractJsonTool), Arc::new(ExtractMermaidTool)]
}

fn input_text(input: &Value) -> &str {
    input["input"].as_str().unwrap_or_default()
}

/// Returns the JSON object embedded in the input, or `null`
pub struct ExtractJsonTool;

#[async_trait]
impl Tool for ExtractJsonTool {
    fn name(&self) -> &str {
        "extract_json"
    }

    fn description(&self) -> &str {
        "Extract the JSON object embedded in free-form text"
    }

    async fn execute(&self, input: Value) -> Result<Value, Box<dyn Error + Send + Sync>> {
        Ok(extract_json(input_text(&input))
            .map(Value::Object)
            .unwrap_or(Value::Null))
    }
}

/// Returns the body of the first ```` ```mermaid ```` block, or an empty string
pub struct ExtractMermaidTool;

#[async_trait]
impl Tool for ExtractMermaidTool {
    fn name(&self) -> &str {
        "extract_mermaid"
    }

    fn description(&self) -> &str {
        "Extract the Mermaid diagram from a fenced code block"
    }

    async fn execute(&self, input: Value) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let code = extract_fenced_code(input_text(&input), "mermaid").unwrap_or_default();
        Ok(json!(code))
    }
}
