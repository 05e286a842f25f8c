//! Create directory built-in tool.

use crate::security::PathGuard;
use crate::tools::builtins::{checked_path, require_non_empty};
use crate::tools::{parse_args, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::Deserialize;
use serde_json::{json, Value};

const TOOL_NAME: &str = "create_directory";

/// Creates a single directory; the parent must exist.
#[derive(Debug, Clone)]
pub struct CreateDirectoryTool {
    guard: PathGuard,
}

#[derive(Debug, Deserialize)]
struct CreateDirectoryArgs {
    path: String,
}

impl CreateDirectoryTool {
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
            description: "Create a directory inside the allowed directories. Creates one level; the parent must exist. Succeeds without change if the directory is already there.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path of the directory to create"
                    }
                },
                "required": ["path"]
            }),
        })
    }
}

impl ToolExecutorTrait for CreateDirectoryTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let guard = self.guard.clone();

        Box::pin(async move {
            let args: CreateDirectoryArgs = parse_args(TOOL_NAME, args)?;
            let path = checked_path(&guard, TOOL_NAME, &args.path).await?;

            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => {
                    return Ok(json!({ "path": path.to_string(), "created": false }));
                }
                Ok(_) => {
                    return Err(ToolError::execution_failed(
                        TOOL_NAME,
                        format!("a file already exists at {}", args.path),
                    ));
                }
                Err(_) => {}
            }

            tokio::fs::create_dir(&path).await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("failed to create directory: {e}"))
            })?;

            Ok(json!({ "path": path.to_string(), "created": true }))
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: CreateDirectoryArgs = parse_args(TOOL_NAME, args.clone())?;
        require_non_empty(TOOL_NAME, "path", &args.path)
    }
}
