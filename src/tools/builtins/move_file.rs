//! Move file built-in tool.

use crate::security::PathGuard;
use crate::tools::builtins::{checked_path, require_non_empty};
use crate::tools::{parse_args, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::Deserialize;
use serde_json::{json, Value};

const TOOL_NAME: &str = "move_file";

/// Moves or renames a file or directory. Never overwrites.
#[derive(Debug, Clone)]
pub struct MoveFileTool {
    guard: PathGuard,
}

#[derive(Debug, Deserialize)]
struct MoveFileArgs {
    source: String,
    destination: String,
}

impl MoveFileTool {
    /// Creates the tool behind the given guard.
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config() -> ToolConfig {
        ToolConfig::new(ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: "Move or rename a file or directory. Both paths must be inside the allowed directories and the destination must not exist.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {
                        "type": "string",
                        "description": "Existing file or directory"
                    },
                    "destination": {
                        "type": "string",
                        "description": "New path; must not exist yet"
                    }
                },
                "required": ["source", "destination"]
            }),
        })
    }
}

impl ToolExecutorTrait for MoveFileTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let guard = self.guard.clone();

        Box::pin(async move {
            let args: MoveFileArgs = parse_args(TOOL_NAME, args)?;
            let source = checked_path(&guard, TOOL_NAME, &args.source).await?;
            let destination = checked_path(&guard, TOOL_NAME, &args.destination).await?;

            if tokio::fs::symlink_metadata(&source).await.is_err() {
                return Err(ToolError::execution_failed(
                    TOOL_NAME,
                    format!("source does not exist: {}", args.source),
                ));
            }
            if tokio::fs::symlink_metadata(&destination).await.is_ok() {
                return Err(ToolError::execution_failed(
                    TOOL_NAME,
                    format!("destination already exists: {}", args.destination),
                ));
            }

            tokio::fs::rename(&source, &destination).await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("failed to move: {e}"))
            })?;

            Ok(json!({
                "source": source.to_string(),
                "destination": destination.to_string()
            }))
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: MoveFileArgs = parse_args(TOOL_NAME, args.clone())?;
        require_non_empty(TOOL_NAME, "source", &args.source)?;
        require_non_empty(TOOL_NAME, "destination", &args.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtins::test_support::guard_for;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn moves_file_within_root() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.txt");
        let to = dir.path().join("b.txt");
        fs::write(&from, "data").unwrap();

        let tool = MoveFileTool::new(guard_for(dir.path()));
        tool.execute(json!({
            "source": from.to_str().unwrap(),
            "destination": to.to_str().unwrap()
        }))
        .await
        .unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "data");
    }

    #[tokio::test]
    async fn refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.txt");
        let to = dir.path().join("b.txt");
        fs::write(&from, "a").unwrap();
        fs::write(&to, "b").unwrap();

        let tool = MoveFileTool::new(guard_for(dir.path()));
        let err = tool
            .execute(json!({
                "source": from.to_str().unwrap(),
                "destination": to.to_str().unwrap()
            }))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&to).unwrap(), "b");
    }

    #[tokio::test]
    async fn destination_outside_root_leaves_source() {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let from = root.path().join("a.txt");
        fs::write(&from, "a").unwrap();

        let tool = MoveFileTool::new(guard_for(root.path()));
        let err = tool
            .execute(json!({
                "source": from.to_str().unwrap(),
                "destination": outside.path().join("a.txt").to_str().unwrap()
            }))
            .await
            .unwrap_err();

        assert!(err.is_denied());
        assert!(from.exists());
    }

    #[tokio::test]
    async fn missing_source_is_reported() {
        let dir = TempDir::new().unwrap();
        let tool = MoveFileTool::new(guard_for(dir.path()));
        let err = tool
            .execute(json!({
                "source": dir.path().join("ghost").to_str().unwrap(),
                "destination": dir.path().join("b").to_str().unwrap()
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("source does not exist"));
    }
}
