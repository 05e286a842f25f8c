//! List allowed directories built-in tool.

use crate::security::PathGuard;
use crate::tools::{ToolConfig, ToolDefinition, ToolExecutionFuture, ToolExecutorTrait};
use serde_json::{json, Value};

const TOOL_NAME: &str = "list_allowed_directories";

/// Reports the roots every path argument must fall under.
#[derive(Debug, Clone)]
pub struct ListAllowedDirectoriesTool {
    guard: PathGuard,
}

impl ListAllowedDirectoriesTool {
    /// Creates the tool for the guard's roots.
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config() -> ToolConfig {
        ToolConfig::new(ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: "List the directories this server is allowed to access. Call this first to learn where files may be read or written.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        })
    }
}

impl ToolExecutorTrait for ListAllowedDirectoriesTool {
    fn execute(&self, _args: Value) -> ToolExecutionFuture {
        let directories: Vec<Value> = self
            .guard
            .roots()
            .iter()
            .map(|root| {
                json!({
                    "path": root.configured().display().to_string(),
                    "resolved": root.canonical().display().to_string()
                })
            })
            .collect();

        Box::pin(async move {
            Ok(json!({
                "count": directories.len(),
                "directories": directories
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::AllowedRoots;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn lists_every_root() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let roots = AllowedRoots::from_dirs([a.path(), b.path()]).unwrap();

        let result = ListAllowedDirectoriesTool::new(PathGuard::new(Arc::new(roots)))
            .execute(json!({}))
            .await
            .unwrap();

        assert_eq!(result["count"], 2);
        assert_eq!(
            result["directories"][0]["path"],
            a.path().display().to_string()
        );
    }

    #[tokio::test]
    async fn empty_roots_list_nothing() {
        let result = ListAllowedDirectoriesTool::new(PathGuard::new(Arc::new(AllowedRoots::empty())))
            .execute(json!({}))
            .await
            .unwrap();
        assert_eq!(result["count"], 0);
    }
}
