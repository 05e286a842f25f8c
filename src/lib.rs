//! # toolwarden: guarded file and shell tools for AI agents
//!
//! An MCP tool server whose every filesystem and command operation passes
//! through one security kernel first:
//!
//! - **PathGuard**: accepts a path only if its fully resolved form lies
//!   inside an allowed root, so `..` tricks and symlinks cannot escape
//! - **CommandGuard**: accepts a command line only if every command in it
//!   starts with an allowlisted prefix
//!
//! ## Architecture
//!
//! - **Config**: TOML file plus CLI overrides, validated once at startup
//! - **Security**: The immutable allowlist snapshot and both guards
//! - **Tools**: Built-in handlers, registry, and prompts
//! - **Server**: JSON-RPC over stdio, requests handled concurrently
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use toolwarden::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WardenConfig::default().with_modules("filesystem")?;
//!     let allowlist = config.build_allowlist()?;
//!
//!     match allowlist.path_guard().validate("/tmp/notes.txt") {
//!         Ok(path) => println!("allowed: {path}"),
//!         Err(rejection) => println!("denied ({}): {rejection}", rejection.code()),
//!     }
//!
//!     let registry = build_registry(&config, &allowlist)?;
//!     let prompts = Prompts::load(&config, &allowlist)?;
//!     McpServer::new(registry, prompts).serve_stdio().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod security;
pub mod server;
pub mod tools;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ToolModule, WardenConfig};
    pub use crate::error::{WardenError, WardenErrorKind};
    pub use crate::security::{
        Allowlist, CanonicalPath, CommandGuard, CommandRejection, PathGuard, PathRejection,
    };
    pub use crate::server::{FileResources, McpServer};
    pub use crate::tools::{build_registry, Prompts, ToolError, ToolRegistry};
    pub use crate::types::RequestId;
}
