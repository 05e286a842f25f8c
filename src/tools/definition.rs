//! Tool definitions and the executor trait.

use crate::tools::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default wall-clock limit for a single tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// The name, description and input schema advertised for a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// The name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the tool's input parameters
    pub input_schema: Value,
}

/// Configuration for a registered tool.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// The tool definition
    pub definition: ToolDefinition,
    /// Execution timeout enforced by the registry
    pub timeout: Duration,
}

impl ToolConfig {
    /// Creates a new tool configuration.
    #[must_use]
    pub fn new(definition: ToolDefinition) -> Self {
        Self {
            definition,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Sets the execution timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The tool's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// The result type for tool execution futures.
pub type ToolExecutionFuture =
    Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'static>>;

/// Trait for executing tools.
///
/// Handlers receive raw, untrusted JSON arguments. Any path or command in
/// them must pass the matching guard before the handler touches the system.
///
/// # Example
///
/// ```rust
/// use toolwarden::tools::{ToolExecutorTrait, ToolExecutionFuture};
/// use serde_json::Value;
///
/// #[derive(Debug)]
/// struct EchoTool;
///
/// impl ToolExecutorTrait for EchoTool {
///     fn execute(&self, args: Value) -> ToolExecutionFuture {
///         Box::pin(async move { Ok(args) })
///     }
/// }
/// ```
pub trait ToolExecutorTrait: Send + Sync + Debug {
    /// Executes the tool with the given arguments.
    fn execute(&self, args: Value) -> ToolExecutionFuture;

    /// Validates the input arguments before execution.
    ///
    /// The default implementation accepts any arguments.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if the arguments are unusable.
    fn validate_args(&self, _args: &Value) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Deserializes tool arguments, mapping failures to `ValidationFailed`.
///
/// # Errors
///
/// Returns `ValidationFailed` naming `tool_name` if `args` does not match `T`.
pub fn parse_args<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    args: Value,
) -> Result<T, ToolError> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::validation_failed(tool_name, format!("invalid arguments: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_test_definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: "test".to_string(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn tool_config_default_timeout() {
        let config = ToolConfig::new(make_test_definition("t"));
        assert_eq!(config.timeout, DEFAULT_TOOL_TIMEOUT);
        assert_eq!(config.name(), "t");
    }

    #[test]
    fn tool_config_with_timeout() {
        let config = ToolConfig::new(make_test_definition("t")).with_timeout(Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn definition_serializes_camel_case() {
        let value = serde_json::to_value(make_test_definition("t")).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn parse_args_maps_to_validation_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Args {
            #[allow(dead_code)]
            path: String,
        }

        let err = parse_args::<Args>("read_file", json!({"nope": 1})).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("read_file"));
    }
}
