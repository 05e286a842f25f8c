//! Get file info built-in tool.

use crate::security::PathGuard;
use crate::tools::builtins::{checked_path, format_time, require_non_empty};
use crate::tools::{parse_args, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::Metadata;

const TOOL_NAME: &str = "get_file_info";

/// Reports size, timestamps, type and permissions of an entry.
#[derive(Debug, Clone)]
pub struct GetFileInfoTool {
    guard: PathGuard,
}

#[derive(Debug, Deserialize)]
struct GetFileInfoArgs {
    path: String,
}

impl GetFileInfoTool {
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
            description: "Get metadata for a file or directory: size, creation, modification and access times, type and permissions.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to inspect"
                    }
                },
                "required": ["path"]
            }),
        })
    }
}

#[cfg(unix)]
fn permissions(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions(metadata: &Metadata) -> String {
    if metadata.permissions().readonly() {
        "readonly".to_string()
    } else {
        "readwrite".to_string()
    }
}

fn describe(metadata: &Metadata) -> Value {
    json!({
        "size": metadata.len(),
        "created": metadata.created().ok().map(format_time),
        "modified": metadata.modified().ok().map(format_time),
        "accessed": metadata.accessed().ok().map(format_time),
        "is_directory": metadata.is_dir(),
        "is_file": metadata.is_file(),
        "permissions": permissions(metadata),
        "readonly": metadata.permissions().readonly()
    })
}

impl ToolExecutorTrait for GetFileInfoTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let guard = self.guard.clone();

        Box::pin(async move {
            let args: GetFileInfoArgs = parse_args(TOOL_NAME, args)?;
            let path = checked_path(&guard, TOOL_NAME, &args.path).await?;

            let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("cannot stat '{}': {e}", args.path))
            })?;

            let mut info = describe(&metadata);
            info["path"] = json!(path.to_string());
            Ok(info)
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: GetFileInfoArgs = parse_args(TOOL_NAME, args.clone())?;
        require_non_empty(TOOL_NAME, "path", &args.path)
    }
}
