//! Read file built-in tool.
//!
//! Reads a text file and returns it with line numbers. Images and other
//! binary files come back base64 encoded when small enough, and as a
//! `file://` reference otherwise.

use crate::security::{CanonicalPath, PathGuard};
use crate::tools::builtins::{checked_path, require_non_empty};
use crate::tools::content::{
    binary_mime, encode_base64, file_uri, is_image, text_mime, FileBody, MAX_BASE64_SIZE,
    MAX_INLINE_SIZE,
};
use crate::tools::{parse_args, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::Deserialize;
use serde_json::{json, Value};

const TOOL_NAME: &str = "read_file";

/// Lines returned when no limit is given.
const DEFAULT_LINE_LIMIT: usize = 2000;

/// Longer lines are cut to this many characters.
const MAX_LINE_CHARS: usize = 2000;

/// Read file tool executor.
#[derive(Debug, Clone)]
pub struct ReadFileTool {
    guard: PathGuard,
}

/// Arguments for the read_file tool.
#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    /// Path to the file to read
    path: String,
    /// Line number to start from (1-indexed)
    #[serde(default)]
    offset: Option<usize>,
    /// Maximum number of lines to read
    #[serde(default)]
    limit: Option<usize>,
}

impl ReadFileTool {
    /// Creates a read file tool behind the given guard.
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config() -> ToolConfig {
        ToolConfig::new(ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: "Read a file inside the allowed directories. Text comes back with line numbers; use offset and limit to page through long files. Images and other binary files up to 1MB come back base64 encoded.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file to read"
                    },
                    "offset": {
                        "type": "integer",
                        "description": "Line number to start from (1-indexed, default: 1)",
                        "minimum": 1
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of lines to read (default: 2000)",
                        "minimum": 1
                    }
                },
                "required": ["path"]
            }),
        })
    }
}

/// Result for a file too large to inline.
fn reference(path: &CanonicalPath, mime: &str, size: u64, label: &str) -> Value {
    let uri = file_uri(path);
    json!({
        "path": path.to_string(),
        "uri": uri,
        "kind": "reference",
        "mime_type": mime,
        "size": size,
        "message": format!("{label}: {path} ({mime}, {size} bytes). Access it via resource URI: {uri}")
    })
}

/// Result for binary content, base64 encoded when under the limit.
fn binary(path: &CanonicalPath, bytes: &[u8]) -> Value {
    let mime = binary_mime(path);
    let size = bytes.len() as u64;
    let image = is_image(mime);
    let label = if image { "Image file" } else { "Binary file" };

    if size > MAX_BASE64_SIZE {
        return reference(path, mime, size, label);
    }
    json!({
        "path": path.to_string(),
        "uri": file_uri(path),
        "kind": if image { "image" } else { "binary" },
        "mime_type": mime,
        "size": size,
        "message": format!("{label}: {path} ({mime}, {size} bytes)"),
        "data": encode_base64(bytes)
    })
}

/// Numbers the selected window of lines.
fn number_lines(content: &str, offset: Option<usize>, limit: Option<usize>) -> Value {
    let start_line = offset.unwrap_or(1).max(1);
    let max_lines = limit.unwrap_or(DEFAULT_LINE_LIMIT).max(1);

    let all_lines: Vec<&str> = content.lines().collect();
    let total_lines = all_lines.len();

    let start_idx = (start_line - 1).min(total_lines);
    let end_idx = start_idx.saturating_add(max_lines).min(total_lines);
    let width = end_idx.to_string().len().max(4);

    let mut formatted = String::new();
    for (idx, line) in all_lines[start_idx..end_idx].iter().enumerate() {
        let line_num = start_idx + idx + 1;
        let shown: String = if line.chars().count() > MAX_LINE_CHARS {
            let mut cut: String = line.chars().take(MAX_LINE_CHARS).collect();
            cut.push_str("...");
            cut
        } else {
            (*line).to_string()
        };
        formatted.push_str(&format!("{line_num:>width$}\t{shown}\n"));
    }

    json!({
        "content": formatted,
        "total_lines": total_lines,
        "start_line": start_line,
        "end_line": if end_idx > start_idx { end_idx } else { start_line },
        "truncated": end_idx < total_lines
    })
}

impl ToolExecutorTrait for ReadFileTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let guard = self.guard.clone();

        Box::pin(async move {
            let args: ReadFileArgs = parse_args(TOOL_NAME, args)?;
            let path = checked_path(&guard, TOOL_NAME, &args.path).await?;

            let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("cannot read '{}': {e}", args.path))
            })?;
            if !metadata.is_file() {
                return Err(ToolError::execution_failed(
                    TOOL_NAME,
                    format!("path is not a file: {}", args.path),
                ));
            }

            if metadata.len() > MAX_INLINE_SIZE {
                return Ok(reference(
                    &path,
                    binary_mime(&path),
                    metadata.len(),
                    "Large file",
                ));
            }

            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("failed to read file: {e}"))
            })?;

            match FileBody::classify(bytes) {
                FileBody::Text(content) => {
                    let mut result = number_lines(&content, args.offset, args.limit);
                    result["path"] = json!(path.to_string());
                    result["kind"] = json!("text");
                    result["mime_type"] = json!(text_mime(&path));
                    Ok(result)
                }
                FileBody::Binary(bytes) => Ok(binary(&path, &bytes)),
            }
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: ReadFileArgs = parse_args(TOOL_NAME, args.clone())?;
        require_non_empty(TOOL_NAME, "path", &args.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtins::test_support::guard_for;
    use crate::tools::ToolErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn ten_lines(dir: &TempDir) -> String {
        let path = dir.path().join("ten.txt");
        let content: String = (1..=10).map(|i| format!("line {i}\n")).collect();
        fs::write(&path, content).unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn read_file_basic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "line 1\nline 2\nline 3\n").unwrap();

        let tool = ReadFileTool::new(guard_for(dir.path()));
        let result = tool
            .execute(json!({ "path": path.to_str().unwrap() }))
            .await
            .unwrap();

        let content = result["content"].as_str().unwrap();
        assert!(content.contains("   1\tline 1"));
        assert!(content.contains("line 3"));
        assert_eq!(result["total_lines"], 3);
        assert_eq!(result["kind"], "text");
        assert_eq!(result["mime_type"], "text/plain");
        assert!(!result["truncated"].as_bool().unwrap());
    }

    #[tokio::test]
    async fn read_file_with_offset_and_limit() {
        let dir = TempDir::new().unwrap();
        let path = ten_lines(&dir);

        let tool = ReadFileTool::new(guard_for(dir.path()));
        let result = tool
            .execute(json!({ "path": path, "offset": 5, "limit": 3 }))
            .await
            .unwrap();

        let content = result["content"].as_str().unwrap();
        assert!(!content.contains("line 4\n"));
        assert!(content.contains("line 5\n"));
        assert!(content.contains("line 7\n"));
        assert!(!content.contains("line 8\n"));
        assert_eq!(result["start_line"], 5);
        assert_eq!(result["end_line"], 7);
        assert!(result["truncated"].as_bool().unwrap());
    }

    #[tokio::test]
    async fn read_file_outside_root_is_denied() {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let path = ten_lines(&outside);

        let tool = ReadFileTool::new(guard_for(root.path()));
        let err = tool.execute(json!({ "path": path })).await.unwrap_err();
        assert!(matches!(err.kind(), ToolErrorKind::PathDenied { .. }));
        assert_eq!(err.code(), "outside_allowed_roots");
    }

    #[tokio::test]
    async fn read_file_missing_file() {
        let dir = TempDir::new().unwrap();
        let tool = ReadFileTool::new(guard_for(dir.path()));
        let err = tool
            .execute(json!({ "path": dir.path().join("nope.txt").to_str().unwrap() }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[tokio::test]
    async fn read_file_refuses_directory() {
        let dir = TempDir::new().unwrap();
        let tool = ReadFileTool::new(guard_for(dir.path()));
        let err = tool
            .execute(json!({ "path": dir.path().to_str().unwrap() }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[tokio::test]
    async fn read_file_encodes_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, [0u8, 1, 2, 0, 3]).unwrap();

        let tool = ReadFileTool::new(guard_for(dir.path()));
        let result = tool
            .execute(json!({ "path": path.to_str().unwrap() }))
            .await
            .unwrap();
        assert_eq!(result["kind"], "binary");
        assert_eq!(result["mime_type"], "application/octet-stream");
        assert_eq!(result["size"], 5);
        assert_eq!(result["data"], "AAECAAM=");
        assert!(result["uri"].as_str().unwrap().starts_with("file://"));
    }

    #[tokio::test]
    async fn read_file_returns_images_as_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dot.png");
        fs::write(&path, [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0]).unwrap();

        let tool = ReadFileTool::new(guard_for(dir.path()));
        let result = tool
            .execute(json!({ "path": path.to_str().unwrap() }))
            .await
            .unwrap();
        assert_eq!(result["kind"], "image");
        assert_eq!(result["mime_type"], "image/png");
        assert!(result["data"].is_string());
    }

    #[tokio::test]
    async fn large_binary_is_referenced_not_encoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        fs::write(&path, vec![0u8; MAX_BASE64_SIZE as usize + 1]).unwrap();

        let tool = ReadFileTool::new(guard_for(dir.path()));
        let result = tool
            .execute(json!({ "path": path.to_str().unwrap() }))
            .await
            .unwrap();
        assert_eq!(result["kind"], "reference");
        assert!(result.get("data").is_none());
        assert!(result["message"].as_str().unwrap().contains("file://"));
    }

    #[test]
    fn long_lines_are_cut_on_char_boundary() {
        let line = "é".repeat(MAX_LINE_CHARS + 10);
        let result = number_lines(&line, None, None);
        let content = result["content"].as_str().unwrap();
        assert!(content.ends_with("...\n"));
    }

    #[test]
    fn validate_args_rejects_empty_path() {
        let dir = TempDir::new().unwrap();
        let tool = ReadFileTool::new(guard_for(dir.path()));
        assert!(tool.validate_args(&json!({ "path": "" })).is_err());
        assert!(tool.validate_args(&json!({})).is_err());
    }
}
