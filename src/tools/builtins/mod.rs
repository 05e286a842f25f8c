//! Built-in tool handlers.
//!
//! ## Filesystem module
//! - **read_file**: Read text with line numbers, or binary content as base64
//! - **write_file**: Create or overwrite a file
//! - **list_directory**: List directory contents with metadata
//! - **create_directory**: Create a single directory
//! - **move_file**: Move or rename without overwriting
//! - **search_files**: Find entries by name substring or wildcard pattern
//! - **get_file_info**: Size, timestamps, type and permissions
//! - **list_allowed_directories**: The roots every path must fall under
//!
//! ## Command module
//! - **execute_command**: Run an allowlisted command line through `sh -c`
//!
//! Every handler owns a clone of the guard it needs. Path arguments go
//! through [`PathGuard`] and command lines through the command guard before
//! any I/O or process spawn, and only the guard's returned path is used
//! afterwards.

mod create_directory;
mod execute_command;
mod get_file_info;
mod list_allowed_directories;
mod list_directory;
mod move_file;
mod read_file;
mod search_files;
mod write_file;

pub use create_directory::CreateDirectoryTool;
pub use execute_command::ExecuteCommandTool;
pub use get_file_info::GetFileInfoTool;
pub use list_allowed_directories::ListAllowedDirectoriesTool;
pub use list_directory::ListDirectoryTool;
pub use move_file::MoveFileTool;
pub use read_file::ReadFileTool;
pub use search_files::SearchFilesTool;
pub use write_file::WriteFileTool;

use crate::config::{ToolModule, WardenConfig};
use crate::security::{Allowlist, CanonicalPath, PathGuard};
use crate::tools::{ToolError, ToolRegistry};
use std::sync::Arc;
use std::time::SystemTime;

/// Tool names provided by a module, in registration order.
#[must_use]
pub fn module_tools(module: ToolModule) -> &'static [&'static str] {
    match module {
        ToolModule::Filesystem => &[
            "read_file",
            "write_file",
            "list_directory",
            "create_directory",
            "move_file",
            "search_files",
            "get_file_info",
            "list_allowed_directories",
        ],
        ToolModule::Command => &["execute_command"],
    }
}

/// Builds a registry holding the tools of every enabled module.
///
/// # Errors
///
/// Returns `AlreadyRegistered` if two tools share a name.
pub fn build_registry(
    config: &WardenConfig,
    allowlist: &Allowlist,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    if config.module_enabled(ToolModule::Filesystem) {
        let guard = allowlist.path_guard();
        registry.register(ReadFileTool::config(), Arc::new(ReadFileTool::new(guard.clone())))?;
        registry.register(WriteFileTool::config(), Arc::new(WriteFileTool::new(guard.clone())))?;
        registry.register(
            ListDirectoryTool::config(),
            Arc::new(ListDirectoryTool::new(guard.clone())),
        )?;
        registry.register(
            CreateDirectoryTool::config(),
            Arc::new(CreateDirectoryTool::new(guard.clone())),
        )?;
        registry.register(MoveFileTool::config(), Arc::new(MoveFileTool::new(guard.clone())))?;
        registry.register(
            SearchFilesTool::config(),
            Arc::new(SearchFilesTool::new(guard.clone())),
        )?;
        registry.register(
            GetFileInfoTool::config(),
            Arc::new(GetFileInfoTool::new(guard.clone())),
        )?;
        registry.register(
            ListAllowedDirectoriesTool::config(),
            Arc::new(ListAllowedDirectoriesTool::new(guard)),
        )?;
    }

    if config.module_enabled(ToolModule::Command) {
        let tool = ExecuteCommandTool::new(allowlist.command_guard(), allowlist.path_guard())
            .with_timeouts(config.command.default_timeout(), config.command.max_timeout());
        registry.register(tool.config(), Arc::new(tool))?;
    }

    tracing::info!(tools = registry.tool_count(), "tool registry built");
    Ok(registry)
}

/// Runs a path argument through the guard off the async threads.
pub(crate) async fn checked_path(
    guard: &PathGuard,
    tool_name: &str,
    path: &str,
) -> Result<CanonicalPath, ToolError> {
    guard
        .validate_blocking(path)
        .await
        .map_err(|rejection| ToolError::path_denied(tool_name, rejection))
}

/// Rejects an empty string argument.
pub(crate) fn require_non_empty(tool_name: &str, field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::validation_failed(
            tool_name,
            format!("{field} cannot be empty"),
        ));
    }
    Ok(())
}

/// Formats a timestamp as RFC 3339 in UTC.
pub(crate) fn format_time(time: SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(time).to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::security::{AllowedRoots, PathGuard};
    use std::path::Path;
    use std::sync::Arc;

    pub fn guard_for(dir: &Path) -> PathGuard {
        PathGuard::new(Arc::new(AllowedRoots::from_dirs([dir]).unwrap()))
    }
}
