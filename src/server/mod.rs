//! MCP-compatible JSON-RPC server.
//!
//! Speaks newline-delimited JSON-RPC 2.0 over stdio and supports
//! `initialize`, `ping`, `tools/list`, `tools/call`, `prompts/list`,
//! `prompts/get`, and, when the filesystem module is enabled,
//! `resources/list` and `resources/read` for `file://` URIs. Tool
//! failures, guard rejections included, come back as results with
//! `isError: true`; protocol faults come back as JSON-RPC errors.

pub mod protocol;
mod resources;
mod stdio;

pub use protocol::{
    CallToolResult, ErrorCode, IncomingMessage, JsonRpcError, JsonRpcResponse, MessageId,
    PROTOCOL_VERSION,
};
pub use resources::FileResources;
pub use stdio::{McpServer, DEFAULT_MAX_IN_FLIGHT};
