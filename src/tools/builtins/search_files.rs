//! Search files built-in tool.
//!
//! Walks a directory tree and returns entries whose name matches a
//! case-insensitive substring or a wildcard pattern. Symlinks are listed
//! but never descended into, and every hit is run back through the guard.

use crate::security::{CanonicalPath, PathGuard};
use crate::tools::builtins::{checked_path, require_non_empty};
use crate::tools::{parse_args, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use serde_json::{json, Value};
use walkdir::WalkDir;

const TOOL_NAME: &str = "search_files";

/// Maximum number of results to return.
const MAX_RESULTS: usize = 1000;

/// Search files tool executor.
#[derive(Debug, Clone)]
pub struct SearchFilesTool {
    guard: PathGuard,
}

/// Arguments for the search_files tool.
#[derive(Debug, Deserialize)]
struct SearchFilesArgs {
    /// Directory to search from
    path: String,
    /// Name substring or wildcard pattern
    pattern: String,
}

/// How entry names are compared against the pattern.
#[derive(Debug)]
enum NameMatcher {
    Substring(String),
    Wildcard(Pattern),
}

impl NameMatcher {
    fn new(pattern: &str) -> Result<Self, ToolError> {
        if pattern.contains(['*', '?', '[']) {
            let compiled = Pattern::new(pattern).map_err(|e| {
                ToolError::validation_failed(TOOL_NAME, format!("invalid pattern '{pattern}': {e}"))
            })?;
            Ok(Self::Wildcard(compiled))
        } else {
            Ok(Self::Substring(pattern.to_lowercase()))
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Substring(needle) => name.to_lowercase().contains(needle.as_str()),
            Self::Wildcard(pattern) => pattern.matches_with(
                name,
                MatchOptions {
                    case_sensitive: false,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                },
            ),
        }
    }
}

impl SearchFilesTool {
    /// Creates a search tool behind the given guard.
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config() -> ToolConfig {
        ToolConfig::new(ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: "Recursively search for files and directories whose name matches a pattern. Plain text matches as a case-insensitive substring; '*', '?' and '[...]' act as wildcards.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Directory to search from"
                    },
                    "pattern": {
                        "type": "string",
                        "description": "Name substring or wildcard pattern (e.g. 'report', '*.rs')"
                    }
                },
                "required": ["path", "pattern"]
            }),
        })
    }
}

/// Walks `root` and collects guarded matches. Runs on a blocking thread.
fn search(guard: &PathGuard, root: &CanonicalPath, matcher: &NameMatcher) -> (Vec<String>, bool) {
    let mut matches = Vec::new();
    let mut truncated = false;

    let walker = WalkDir::new(root.as_path())
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok);

    for entry in walker {
        let name = entry.file_name().to_string_lossy();
        if !matcher.matches(&name) {
            continue;
        }

        match guard.validate(entry.path()) {
            Ok(_) => {
                if matches.len() >= MAX_RESULTS {
                    truncated = true;
                    break;
                }
                matches.push(entry.path().display().to_string());
            }
            Err(rejection) => {
                tracing::debug!(code = rejection.code(), "search hit dropped by guard");
            }
        }
    }

    matches.sort();
    (matches, truncated)
}

impl ToolExecutorTrait for SearchFilesTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let guard = self.guard.clone();

        Box::pin(async move {
            let args: SearchFilesArgs = parse_args(TOOL_NAME, args)?;
            let matcher = NameMatcher::new(&args.pattern)?;
            let root = checked_path(&guard, TOOL_NAME, &args.path).await?;

            let is_dir = tokio::fs::metadata(&root)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                return Err(ToolError::execution_failed(
                    TOOL_NAME,
                    format!("path is not a directory: {}", args.path),
                ));
            }

            let root_display = root.to_string();
            let (matches, truncated) =
                tokio::task::spawn_blocking(move || search(&guard, &root, &matcher))
                    .await
                    .map_err(|e| ToolError::internal(format!("search task failed: {e}")))?;

            Ok(json!({
                "path": root_display,
                "pattern": args.pattern,
                "count": matches.len(),
                "matches": matches,
                "truncated": truncated
            }))
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: SearchFilesArgs = parse_args(TOOL_NAME, args.clone())?;
        require_non_empty(TOOL_NAME, "path", &args.path)?;
        require_non_empty(TOOL_NAME, "pattern", &args.pattern)?;
        NameMatcher::new(&args.pattern).map(|_| ())
    }
}
