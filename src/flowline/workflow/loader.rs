// SPDX-License-Identifier: MIT

//! Workflow loader - YAML or JSON definitions
//!
//! JSON is a subset of YAML, so a single serde_yaml pass covers both.

use super::graph::Workflow;
use crate::adk::error::{FlowlineError, WorkflowError};
use std::fs;
use std::path::Path;

/// Loads and validates workflow definitions
pub struct WorkflowLoader;

impl WorkflowLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a workflow from a YAML or JSON file
    pub fn load_workflow<P: AsRef<Path>>(&self, path: P) -> Result<Workflow, FlowlineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WorkflowError::FileNotFound(path.display().to_string()).into());
        }
        let content = fs::read_to_string(path)?;
        let workflow = Self::parse(&content)?;
        log::info!(
            "Loaded workflow '{}' from {} ({} nodes, {} edges)",
            workflow.name,
            path.display(),
            workflow.nodes.len(),
            workflow.edges.len()
        );
        Ok(workflow)
    }

    /// Parse and validate a workflow definition
    pub fn parse(content: &str) -> Result<Workflow, FlowlineError> {
        let mut workflow: Workflow = serde_yaml::from_str(content)?;
        for edge in workflow.edges.iter_mut().filter(|e| e.id.is_empty()) {
            edge.id = format!("e-{}-{}", edge.source, edge.target);
        }
        workflow.validate()?;
        Ok(workflow)
    }
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}
