// SPDX-License-Identifier: MIT

//! Project persistence port
//!
//! The engine itself keeps nothing between runs; hosts save the workflow,
//! the last run's log and the last roadmap through a `ProjectStore`.

use crate::adk::error::FlowlineError;
use crate::flowline::roadmap::RoadmapData;
use crate::flowline::workflow::graph::Workflow;
use crate::flowline::workflow::run::ExecutionLogEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;

/// Everything a host persists for one project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub workflow: Workflow,
    #[serde(default)]
    pub logs: Vec<ExecutionLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<RoadmapData>,
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// The saved snapshot, or `None` if nothing was saved yet
    async fn load(&self) -> Result<Option<ProjectSnapshot>, FlowlineError>;

    async fn save(&self, snapshot: &ProjectSnapshot) -> Result<(), FlowlineError>;
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<ProjectSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn load(&self) -> Result<Option<ProjectSnapshot>, FlowlineError> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &ProjectSnapshot) -> Result<(), FlowlineError> {
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }
}

/// Pretty-printed JSON file
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProjectStore for FileStore {
    async fn load(&self) -> Result<Option<ProjectSnapshot>, FlowlineError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save(&self, snapshot: &ProjectSnapshot) -> Result<(), FlowlineError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, content).await?;
        log::debug!("Saved project to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowline::workflow::graph::Node;
    use crate::flowline::workflow::run::NodeStatus;

    fn snapshot() -> ProjectSnapshot {
        let mut entry = ExecutionLogEntry::running("t1", "Trigger");
        entry.finish(NodeStatus::Success, "idea".to_string());
        ProjectSnapshot {
            workflow: Workflow::linear("saved", vec![Node::trigger("t1", "idea"), Node::end("end")]),
            logs: vec![entry],
            roadmap: None,
        }
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&snapshot()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.workflow.name, "saved");
        assert_eq!(loaded.logs.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("project.json"));
        assert!(store.load().await.unwrap().is_none());

        store.save(&snapshot()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.workflow.nodes.len(), 2);
        assert_eq!(loaded.workflow.edges[0].id, "e-t1-end");
        assert_eq!(loaded.logs[0].status, NodeStatus::Success);
    }
}
