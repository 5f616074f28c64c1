// SPDX-License-Identifier: MIT

//! Workflow graph: node/edge model, ordering and mutation primitives

mod edit;
mod order;
mod types;

pub use edit::NodePatch;
pub use order::topological_order;
pub use types::{
    AgentConfig, Edge, EndConfig, InputType, Node, NodeConfig, NodeKind, Position, ToolConfig,
    TriggerConfig, Workflow, DEFAULT_TRIGGER_VAR,
};
