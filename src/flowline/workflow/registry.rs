// SPDX-License-Identifier: MIT

//! Named tools reachable from Tool nodes

use crate::adk::tool::Tool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type ToolTable = BTreeMap<String, Arc<dyn Tool>>;

/// Tool lookup shared by every clone of the registry
#[derive(Clone, Default)]
pub struct ToolRegistry {
    table: Arc<RwLock<ToolTable>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with `extract_json` and `extract_mermaid`
    pub async fn with_builtins() -> Self {
        let registry = Self::new();
        for tool in crate::flowline::tools::builtin_tools() {
            registry.register(tool).await;
        }
        registry
    }

    /// Add `tool` under its own name; an existing tool of that name is replaced
    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.table.write().await.insert(name.clone(), tool).is_some() {
            log::warn!("Tool '{}' replaced an earlier registration", name);
        } else {
            log::debug!("Registered tool: {}", name);
        }
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.table.read().await.get(name).map(Arc::clone)
    }

    /// Registered names in ascending order
    pub async fn names(&self) -> Vec<String> {
        self.table.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::error::Error;

    /// Echoes a fixed label so replacement is observable
    struct LabelTool {
        name: &'static str,
        label: &'static str,
    }

    #[async_trait]
    impl Tool for LabelTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Returns its label"
        }

        async fn execute(&self, _input: Value) -> Result<Value, Box<dyn Error + Send + Sync>> {
            Ok(json!(self.label))
        }
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let registry = ToolRegistry::new();
        registry
            .register(Arc::new(LabelTool { name: "upper", label: "A" }))
            .await;

        assert_eq!(registry.get("upper").await.unwrap().name(), "upper");
        assert!(registry.get("lower").await.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_one_table() {
        let registry = ToolRegistry::new();
        registry
            .clone()
            .register(Arc::new(LabelTool { name: "shared", label: "S" }))
            .await;
        assert_eq!(registry.names().await, vec!["shared".to_string()]);
    }

    #[tokio::test]
    async fn test_reregistering_replaces() {
        let registry = ToolRegistry::new();
        registry
            .register(Arc::new(LabelTool { name: "t", label: "old" }))
            .await;
        registry
            .register(Arc::new(LabelTool { name: "t", label: "new" }))
            .await;

        let tool = registry.get("t").await.unwrap();
        assert_eq!(tool.execute(json!({})).await.unwrap(), json!("new"));
        assert_eq!(registry.names().await.len(), 1);
    }

    #[tokio::test]
    async fn test_builtins_listed() {
        let registry = ToolRegistry::with_builtins().await;
        assert_eq!(
            registry.names().await,
            vec!["extract_json".to_string(), "extract_mermaid".to_string()]
        );
    }
}
