// SPDX-License-Identifier: MIT

//! Engine configuration
//!
//! Loaded from a YAML or JSON file (every field optional) and/or overlaid
//! from `FLOWLINE_*` environment variables.

use crate::adk::error::FlowlineError;
use crate::adk::generation::{GenerationOptions, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub generation: GenerationSettings,
    /// Pause after each successful node, for live displays
    pub node_delay_ms: u64,
    pub roadmap: RoadmapSlots,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub default_model: String,
    /// Explicit provider; inferred from the model name when absent
    pub provider: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 600_000,
            max_retries: 3,
            base_delay_ms: 2_000,
            default_model: DEFAULT_MODEL.to_string(),
            provider: None,
        }
    }
}

impl GenerationSettings {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            retry: RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms)),
        }
    }
}

/// Output variables the roadmap reconciler reads after a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapSlots {
    pub extraction_var: String,
    pub planning_var: String,
}

impl Default for RoadmapSlots {
    fn default() -> Self {
        Self {
            extraction_var: "extraction".to_string(),
            planning_var: "planning".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a config file (YAML or JSON)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FlowlineError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, FlowlineError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Defaults overlaid with `FLOWLINE_*` environment variables
    pub fn from_env() -> Result<Self, FlowlineError> {
        Self::default().with_env_overrides()
    }

    /// Apply `FLOWLINE_*` environment variables on top of this config
    pub fn with_env_overrides(mut self) -> Result<Self, FlowlineError> {
        if let Some(v) = env_parse("FLOWLINE_TIMEOUT_MS")? {
            self.generation.timeout_ms = v;
        }
        if let Some(v) = env_parse("FLOWLINE_MAX_RETRIES")? {
            self.generation.max_retries = v;
        }
        if let Some(v) = env_parse("FLOWLINE_BASE_DELAY_MS")? {
            self.generation.base_delay_ms = v;
        }
        if let Some(v) = env_parse("FLOWLINE_NODE_DELAY_MS")? {
            self.node_delay_ms = v;
        }
        if let Ok(model) = env::var("FLOWLINE_MODEL") {
            self.generation.default_model = model;
        }
        Ok(self)
    }

    pub fn node_delay(&self) -> Duration {
        Duration::from_millis(self.node_delay_ms)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, FlowlineError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FlowlineError::config(format!("{} has invalid value '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.generation.timeout_ms, 600_000);
        assert_eq!(cfg.generation.max_retries, 3);
        assert_eq!(cfg.generation.default_model, DEFAULT_MODEL);
        assert_eq!(cfg.node_delay_ms, 0);
        assert_eq!(cfg.roadmap.extraction_var, "extraction");
        assert_eq!(cfg.roadmap.planning_var, "planning");
    }

    #[test]
    fn test_partial_yaml() {
        let cfg = EngineConfig::parse(
            r#"
generation:
  timeout_ms: 240000
roadmap:
  planning_var: plan
"#,
        )
        .unwrap();
        assert_eq!(cfg.generation.timeout_ms, 240_000);
        assert_eq!(cfg.generation.max_retries, 3);
        assert_eq!(cfg.roadmap.planning_var, "plan");
        assert_eq!(cfg.roadmap.extraction_var, "extraction");
    }

    #[test]
    fn test_json_config() {
        let cfg = EngineConfig::parse(r#"{"node_delay_ms": 500}"#).unwrap();
        assert_eq!(cfg.node_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_generation_options() {
        let settings = GenerationSettings {
            timeout_ms: 1_000,
            max_retries: 2,
            base_delay_ms: 10,
            ..Default::default()
        };
        let opts = settings.options();
        assert_eq!(opts.timeout, Duration::from_secs(1));
        assert_eq!(opts.retry.max_retries, 2);
        assert_eq!(opts.retry.delay_for(2), Duration::from_millis(20));
    }
}
