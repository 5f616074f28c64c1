// SPDX-License-Identifier: MIT

//! Run-level types: statuses, the execution log and live update events

use crate::flowline::roadmap::RoadmapData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Lifecycle of one node within a run; Success and Error are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Error)
    }
}

/// One entry per executed node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogEntry {
    pub node_id: String,
    pub node_label: String,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<Value>,
}

impl ExecutionLogEntry {
    pub fn running(node_id: &str, node_label: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            node_label: node_label.to_string(),
            status: NodeStatus::Running,
            input: None,
            output: None,
            timestamp: Utc::now(),
            grounding_metadata: None,
        }
    }

    /// Move to a terminal status; terminal entries never change again
    pub(crate) fn finish(&mut self, status: NodeStatus, output: String) {
        if self.status.is_terminal() {
            log::warn!(
                "Ignoring transition of finished node {} to {:?}",
                self.node_id,
                status
            );
            return;
        }
        self.status = status;
        self.output = Some(output);
        self.timestamp = Utc::now();
    }
}

/// Live update emitted on every run and node transition.
///
/// `Finished` is always the last event of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RunEvent {
    Status(RunStatus),
    Log(ExecutionLogEntry),
    Finished(Box<RunOutcome>),
}

/// Everything a host needs after a run: status, log, context and roadmap
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub status: RunStatus,
    pub logs: Vec<ExecutionLogEntry>,
    /// Snapshot of the variable context at the end of the run
    pub context: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<RoadmapData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
