//! Tool system for the toolwarden server.
//!
//! This module provides the infrastructure for tool registration and execution:
//!
//! - **Tool Registry**: Maps tool names to executors and dispatches calls
//! - **Built-in Tools**: Filesystem and command handlers behind the guards
//! - **Prompts**: Usage guidance served alongside the tools
//! - **Content**: Text/binary sniffing, MIME types and `file://` URIs
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                      ToolRegistry                            |
//! |                                                              |
//! |  execute(name, args)                                         |
//! |    --> lookup (NotFound + suggestion)                        |
//! |    --> validate_args                                         |
//! |    --> timeout(executor.execute(args))                       |
//! |                                                              |
//! +-------------------------------------------------------------+
//!                            |
//!                            v
//! +-------------------------------------------------------------+
//! |               Built-in tool (one per name)                   |
//! |                                                              |
//! |  PathGuard / CommandGuard --> I/O or process spawn           |
//! |                                                              |
//! +-------------------------------------------------------------+
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use toolwarden::config::WardenConfig;
//! use toolwarden::tools::build_registry;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WardenConfig::default();
//! let allowlist = config.build_allowlist()?;
//! let registry = build_registry(&config, &allowlist)?;
//!
//! let result = registry
//!     .execute("list_allowed_directories", serde_json::json!({}))
//!     .await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod builtins;
pub mod content;
pub mod definition;
pub mod error;
pub mod prompt;
pub mod registry;

// Re-exports
pub use builtins::{build_registry, module_tools};
pub use definition::{
    parse_args, ToolConfig, ToolDefinition, ToolExecutionFuture, ToolExecutorTrait,
    DEFAULT_TOOL_TIMEOUT,
};
pub use error::{ToolError, ToolErrorKind};
pub use prompt::{Prompt, PromptInfo, Prompts, COMMAND_PROMPT, FILESYSTEM_PROMPT};
pub use registry::{RegisteredTool, ToolRegistry};
