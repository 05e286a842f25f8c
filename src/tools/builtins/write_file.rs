//! Write file built-in tool.
//!
//! Creates or overwrites a file. The parent directory must already exist.

use crate::security::PathGuard;
use crate::tools::builtins::{checked_path, require_non_empty};
use crate::tools::{parse_args, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::Deserialize;
use serde_json::{json, Value};

const TOOL_NAME: &str = "write_file";

/// Write file tool executor.
#[derive(Debug, Clone)]
pub struct WriteFileTool {
    guard: PathGuard,
}

/// Arguments for the write_file tool.
#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    /// Path to the file to write
    path: String,
    /// Content to write to the file
    content: String,
}

impl WriteFileTool {
    /// Creates a write file tool behind the given guard.
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config() -> ToolConfig {
        ToolConfig::new(ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: "Create a new file or overwrite an existing one inside the allowed directories. The parent directory must exist.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file to write"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write to the file"
                    }
                },
                "required": ["path", "content"]
            }),
        })
    }
}

impl ToolExecutorTrait for WriteFileTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let guard = self.guard.clone();

        Box::pin(async move {
            let args: WriteFileArgs = parse_args(TOOL_NAME, args)?;
            let path = checked_path(&guard, TOOL_NAME, &args.path).await?;

            let existed = match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => {
                    return Err(ToolError::execution_failed(
                        TOOL_NAME,
                        format!("path is a directory: {}", args.path),
                    ));
                }
                Ok(_) => true,
                Err(_) => false,
            };

            tokio::fs::write(&path, args.content.as_bytes())
                .await
                .map_err(|e| {
                    ToolError::execution_failed(TOOL_NAME, format!("failed to write file: {e}"))
                })?;

            Ok(json!({
                "path": path.to_string(),
                "bytes_written": args.content.len(),
                "created": !existed
            }))
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: WriteFileArgs = parse_args(TOOL_NAME, args.clone())?;
        require_non_empty(TOOL_NAME, "path", &args.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtins::test_support::guard_for;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_file_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.txt");

        let tool = WriteFileTool::new(guard_for(dir.path()));
        let result = tool
            .execute(json!({ "path": path.to_str().unwrap(), "content": "hello" }))
            .await
            .unwrap();

        assert_eq!(result["bytes_written"], 5);
        assert!(result["created"].as_bool().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[tokio::test]
    async fn write_file_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "old").unwrap();

        let tool = WriteFileTool::new(guard_for(dir.path()));
        let result = tool
            .execute(json!({ "path": path.to_str().unwrap(), "content": "new" }))
            .await
            .unwrap();

        assert!(!result["created"].as_bool().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[tokio::test]
    async fn write_file_outside_root_writes_nothing() {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("pwned.txt");

        let tool = WriteFileTool::new(guard_for(root.path()));
        let err = tool
            .execute(json!({ "path": target.to_str().unwrap(), "content": "x" }))
            .await
            .unwrap_err();

        assert!(err.is_denied());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn write_file_needs_existing_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("a.txt");

        let tool = WriteFileTool::new(guard_for(dir.path()));
        let err = tool
            .execute(json!({ "path": path.to_str().unwrap(), "content": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "parent_missing");
    }

    #[tokio::test]
    async fn write_file_refuses_directory() {
        let dir = TempDir::new().unwrap();
        let tool = WriteFileTool::new(guard_for(dir.path()));
        let err = tool
            .execute(json!({ "path": dir.path().to_str().unwrap(), "content": "x" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn write_through_escaping_link_is_denied() {
        use std::os::unix::fs::symlink;

        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("target.txt");
        symlink(&target, root.path().join("link.txt")).unwrap();

        let tool = WriteFileTool::new(guard_for(root.path()));
        let err = tool
            .execute(json!({
                "path": root.path().join("link.txt").to_str().unwrap(),
                "content": "x"
            }))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "symlink_escapes_root");
        assert!(!target.exists());
    }
}
