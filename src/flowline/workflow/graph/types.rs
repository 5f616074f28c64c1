// SPDX-License-Identifier: MIT

//! Workflow graph types
//!
//! Node configuration is a tagged union keyed by `kind`; each variant carries
//! only the fields its node kind uses. Unknown (UI-only) fields are ignored.

use crate::adk::error::WorkflowError;
use crate::adk::model::MediaPart;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default output variable for Trigger nodes
pub const DEFAULT_TRIGGER_VAR: &str = "userInput";

/// A complete workflow: nodes plus directed edges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A unit of work in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub config: NodeConfig,
    /// Canvas position; carried for the host, ignored by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Node kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Agent,
    Tool,
    End,
}

/// Per-kind node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeConfig {
    Trigger(TriggerConfig),
    Agent(AgentConfig),
    Tool(ToolConfig),
    End(EndConfig),
}

/// How a Trigger node supplies its input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    Text,
    File,
    Audio,
    Structured,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default, alias = "inputType")]
    pub input_type: InputType,
    #[serde(default, alias = "inputText", alias = "input")]
    pub input_text: String,
    /// File or audio payloads attached to the input
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaPart>,
    #[serde(default, alias = "outputVar", skip_serializing_if = "Option::is_none")]
    pub output_var: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, alias = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Model identifier; the engine default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, alias = "outputVar", skip_serializing_if = "Option::is_none")]
    pub output_var: Option<String>,
    #[serde(default, alias = "useSearch")]
    pub use_search: bool,
    #[serde(default, alias = "thinkingBudget", skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Registered tool name; absent means the input passes through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default)]
    pub input: String,
    #[serde(default, alias = "outputVar", skip_serializing_if = "Option::is_none")]
    pub output_var: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndConfig {
    /// Variable to display; the last-written value when absent
    #[serde(default, alias = "outputVar", skip_serializing_if = "Option::is_none")]
    pub output_var: Option<String>,
}

/// Directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "sourceNodeId", alias = "from")]
    pub source: String,
    #[serde(alias = "targetNodeId", alias = "to")]
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("e-{}-{}", source, target),
            source,
            target,
        }
    }
}

impl NodeConfig {
    /// Default configuration for a freshly created node of `kind`
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Trigger => NodeConfig::Trigger(TriggerConfig::default()),
            NodeKind::Agent => NodeConfig::Agent(AgentConfig::default()),
            NodeKind::Tool => NodeConfig::Tool(ToolConfig::default()),
            NodeKind::End => NodeConfig::End(EndConfig::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Trigger(_) => NodeKind::Trigger,
            NodeConfig::Agent(_) => NodeKind::Agent,
            NodeConfig::Tool(_) => NodeKind::Tool,
            NodeConfig::End(_) => NodeKind::End,
        }
    }
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, config: NodeConfig) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            config,
            position: None,
        }
    }

    pub fn trigger(id: &str, input_text: &str) -> Self {
        Self::new(
            id,
            "Trigger",
            NodeConfig::Trigger(TriggerConfig {
                input_text: input_text.to_string(),
                ..Default::default()
            }),
        )
    }

    pub fn agent(id: &str, prompt: &str, output_var: &str) -> Self {
        Self::new(
            id,
            id,
            NodeConfig::Agent(AgentConfig {
                prompt: prompt.to_string(),
                output_var: Some(output_var.to_string()),
                ..Default::default()
            }),
        )
    }

    pub fn end(id: &str) -> Self {
        Self::new(id, "End", NodeConfig::End(EndConfig::default()))
    }

    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    /// The variable this node writes, with defaults applied.
    ///
    /// End nodes write nothing.
    pub fn output_var(&self) -> Option<String> {
        let explicit = match &self.config {
            NodeConfig::Trigger(c) => c.output_var.as_deref(),
            NodeConfig::Agent(c) => c.output_var.as_deref(),
            NodeConfig::Tool(c) => c.output_var.as_deref(),
            NodeConfig::End(_) => return None,
        };
        Some(match explicit {
            Some(v) => v.to_string(),
            None if self.kind() == NodeKind::Trigger => DEFAULT_TRIGGER_VAR.to_string(),
            None => format!("{}_output", self.id),
        })
    }

    fn validate(&self) -> Result<(), WorkflowError> {
        let invalid = |reason: &str| WorkflowError::InvalidNode {
            node: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("node id must not be empty"));
        }
        let explicit_var = match &self.config {
            NodeConfig::Trigger(c) => c.output_var.as_deref(),
            NodeConfig::Agent(c) => c.output_var.as_deref(),
            NodeConfig::Tool(c) => c.output_var.as_deref(),
            NodeConfig::End(c) => c.output_var.as_deref(),
        };
        if explicit_var.is_some_and(|v| v.trim().is_empty()) {
            return Err(invalid("output variable must not be empty"));
        }
        if let NodeConfig::Agent(c) = &self.config {
            if c.prompt.trim().is_empty() {
                return Err(invalid("agent prompt must not be empty"));
            }
        }
        Ok(())
    }
}

impl Workflow {
    pub fn new(name: impl Into<String>, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            nodes,
            edges,
        }
    }

    /// Chain the given nodes linearly in declaration order
    pub fn linear(name: impl Into<String>, nodes: Vec<Node>) -> Self {
        let edges = nodes
            .windows(2)
            .map(|pair| Edge::new(&pair[0].id, &pair[1].id))
            .collect();
        Self::new(name, nodes, edges)
    }

    /// Check node configs, id uniqueness and edge endpoints.
    ///
    /// Self-loops and cycles are accepted; ordering degrades gracefully.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            node.validate()?;
            if !seen.insert(node.id.as_str()) {
                return Err(WorkflowError::DuplicateNode(node.id.clone()));
            }
        }
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(WorkflowError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }
}
