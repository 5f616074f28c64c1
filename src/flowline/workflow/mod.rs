// SPDX-License-Identifier: MIT

//! Workflow engine: graph model, variable context, extraction and execution

pub mod context;
pub mod executor;
pub mod extract;
pub mod graph;
pub mod loader;
pub mod registry;
pub mod run;
pub mod session;

pub use executor::WorkflowExecutor;
pub use graph::{Edge, Node, NodeConfig, NodeKind, NodePatch, Workflow};
pub use loader::WorkflowLoader;
pub use run::{ExecutionLogEntry, NodeStatus, RunEvent, RunOutcome, RunStatus};
pub use session::{RunGuard, Session};
