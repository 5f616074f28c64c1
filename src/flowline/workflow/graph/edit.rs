// SPDX-License-Identifier: MIT

//! Node mutation primitives exposed to the host (and to chat assistants driving it)

use super::types::{Edge, InputType, Node, NodeConfig, NodeKind, Workflow};
use crate::adk::error::WorkflowError;
use crate::adk::model::MediaPart;
use serde::{Deserialize, Serialize};

/// Partial update for a node; `None` fields are left untouched.
///
/// Fields that do not apply to the node's kind are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub prompt: Option<String>,
    #[serde(alias = "systemInstruction")]
    pub system_instruction: Option<String>,
    pub model: Option<String>,
    #[serde(alias = "outputVar")]
    pub output_var: Option<String>,
    #[serde(alias = "useSearch")]
    pub use_search: Option<bool>,
    #[serde(alias = "thinkingBudget")]
    pub thinking_budget: Option<u32>,
    #[serde(alias = "inputText")]
    pub input_text: Option<String>,
    pub tool: Option<String>,
}

impl Workflow {
    /// Append a node of `kind` with default configuration and return its id
    pub fn create_node(&mut self, kind: NodeKind, label: impl Into<String>) -> String {
        let id = format!("{:?}-{}", kind, uuid::Uuid::new_v4().simple()).to_lowercase();
        self.nodes
            .push(Node::new(id.clone(), label, NodeConfig::for_kind(kind)));
        log::debug!("Created node {}", id);
        id
    }

    /// Apply a patch to an existing node
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<(), WorkflowError> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| WorkflowError::NodeNotFound(id.to_string()))?;

        if let Some(label) = patch.label {
            node.label = label;
        }

        match &mut node.config {
            NodeConfig::Trigger(c) => {
                set(&mut c.input_text, patch.input_text);
                if patch.output_var.is_some() {
                    c.output_var = patch.output_var;
                }
            }
            NodeConfig::Agent(c) => {
                set(&mut c.prompt, patch.prompt);
                set(&mut c.use_search, patch.use_search);
                if patch.system_instruction.is_some() {
                    c.system_instruction = patch.system_instruction;
                }
                if patch.model.is_some() {
                    c.model = patch.model;
                }
                if patch.output_var.is_some() {
                    c.output_var = patch.output_var;
                }
                if patch.thinking_budget.is_some() {
                    c.thinking_budget = patch.thinking_budget;
                }
            }
            NodeConfig::Tool(c) => {
                if patch.tool.is_some() {
                    c.tool = patch.tool;
                }
                if patch.output_var.is_some() {
                    c.output_var = patch.output_var;
                }
            }
            NodeConfig::End(c) => {
                if patch.output_var.is_some() {
                    c.output_var = patch.output_var;
                }
            }
        }
        Ok(())
    }

    /// Add an edge between two existing nodes and return its id
    pub fn connect(&mut self, source: &str, target: &str) -> Result<String, WorkflowError> {
        for endpoint in [source, target] {
            if self.node(endpoint).is_none() {
                return Err(WorkflowError::NodeNotFound(endpoint.to_string()));
            }
        }
        let edge = Edge::new(source, target);
        let id = edge.id.clone();
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
        Ok(id)
    }

    /// Remove a node and every edge attached to it
    pub fn remove_node(&mut self, id: &str) -> Result<Node, WorkflowError> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| WorkflowError::NodeNotFound(id.to_string()))?;
        self.edges.retain(|e| e.source != id && e.target != id);
        Ok(self.nodes.remove(pos))
    }

    /// Replace the input of the first Trigger node.
    ///
    /// Attached media switches a text trigger to file input.
    pub fn set_trigger_input(
        &mut self,
        text: impl Into<String>,
        media: Vec<MediaPart>,
    ) -> Result<(), WorkflowError> {
        let cfg = self
            .nodes
            .iter_mut()
            .find_map(|n| match &mut n.config {
                NodeConfig::Trigger(cfg) => Some(cfg),
                _ => None,
            })
            .ok_or_else(|| WorkflowError::NodeNotFound("trigger".to_string()))?;

        cfg.input_text = text.into();
        if !media.is_empty() {
            if cfg.input_type == InputType::Text {
                cfg.input_type = InputType::File;
            }
            cfg.media = media;
        }
        Ok(())
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}
