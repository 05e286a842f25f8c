//! List directory built-in tool.

use crate::security::PathGuard;
use crate::tools::builtins::{checked_path, format_time, require_non_empty};
use crate::tools::{parse_args, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const TOOL_NAME: &str = "list_directory";

/// List directory tool executor.
///
/// Lists entries with type, size and modification time.
#[derive(Debug, Clone)]
pub struct ListDirectoryTool {
    guard: PathGuard,
}

/// Arguments for the list_directory tool.
#[derive(Debug, Deserialize)]
struct ListDirectoryArgs {
    /// Directory path to list
    path: String,
}

/// Information about a directory entry.
#[derive(Debug, Serialize)]
struct DirEntry {
    name: String,
    /// "file", "dir" or "symlink"
    entry_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
}

impl ListDirectoryTool {
    /// Creates a list directory tool behind the given guard.
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config() -> ToolConfig {
        ToolConfig::new(ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: "List a directory inside the allowed directories, with type, size and modified time for each entry.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Directory path to list"
                    }
                },
                "required": ["path"]
            }),
        })
    }
}

impl ToolExecutorTrait for ListDirectoryTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let guard = self.guard.clone();

        Box::pin(async move {
            let args: ListDirectoryArgs = parse_args(TOOL_NAME, args)?;
            let path = checked_path(&guard, TOOL_NAME, &args.path).await?;

            let mut read_dir = tokio::fs::read_dir(&path).await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("failed to read directory: {e}"))
            })?;

            let mut entries = Vec::new();
            while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("failed to read entry: {e}"))
            })? {
                // Not followed: a link is reported as a link, never as its target.
                let metadata = tokio::fs::symlink_metadata(entry.path()).await.ok();

                let entry_type = match &metadata {
                    Some(m) if m.file_type().is_symlink() => "symlink",
                    Some(m) if m.is_dir() => "dir",
                    _ => "file",
                };

                entries.push(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    entry_type,
                    size: metadata.as_ref().filter(|m| m.is_file()).map(|m| m.len()),
                    modified: metadata
                        .as_ref()
                        .and_then(|m| m.modified().ok())
                        .map(format_time),
                });
            }

            entries.sort_by(|a, b| a.name.cmp(&b.name));

            Ok(json!({
                "path": path.to_string(),
                "count": entries.len(),
                "entries": entries
            }))
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: ListDirectoryArgs = parse_args(TOOL_NAME, args.clone())?;
        require_non_empty(TOOL_NAME, "path", &args.path)
    }
}
