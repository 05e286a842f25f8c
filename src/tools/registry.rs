//! Tool registry and dispatch.
//!
//! The registry is filled once at startup and then shared read-only behind
//! an `Arc`, so concurrent calls need no locking.

use crate::tools::definition::{ToolConfig, ToolDefinition, ToolExecutorTrait};
use crate::tools::error::ToolError;
use crate::types::RequestId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// A registered tool with its configuration.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    /// The tool configuration
    pub config: ToolConfig,
    /// The tool executor
    pub executor: Arc<dyn ToolExecutorTrait>,
}

/// Maps tool names to executors and runs calls against them.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    /// Registration order, used for listing
    order: Vec<String>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its definition's name.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the name is taken.
    pub fn register(
        &mut self,
        config: ToolConfig,
        executor: Arc<dyn ToolExecutorTrait>,
    ) -> Result<(), ToolError> {
        let tool_name = config.name().to_string();
        if self.tools.contains_key(&tool_name) {
            return Err(ToolError::already_registered(&tool_name));
        }

        tracing::debug!(tool_name = %tool_name, timeout_secs = config.timeout.as_secs(), "tool registered");
        self.order.push(tool_name.clone());
        self.tools.insert(tool_name, RegisteredTool { config, executor });
        Ok(())
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if a tool with the given name is registered.
    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions of every tool, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.config.definition.clone())
            .collect()
    }

    /// Closest registered name to `name`, if one is close enough to be a typo.
    #[must_use]
    pub fn suggest(&self, name: &str) -> Option<String> {
        let threshold = (name.len() / 3).max(2);
        self.order
            .iter()
            .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
            .filter(|(distance, _)| *distance <= threshold)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate.clone())
    }

    /// Runs a tool call.
    ///
    /// Each call gets a fresh [`RequestId`] and a tracing span carrying it.
    /// Arguments are validated before execution and the call is bounded by
    /// the tool's configured timeout.
    ///
    /// # Errors
    ///
    /// Returns the tool's error, or `NotFound`, `ValidationFailed` or
    /// `Timeout` from the registry itself. Every error carries the request ID.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let request_id = RequestId::new();
        let span = tracing::info_span!("tool_call", tool = %name, request_id = %request_id);

        self.dispatch(name, args)
            .instrument(span)
            .await
            .map_err(|e| e.with_request_id(request_id))
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let Some(tool) = self.tools.get(name) else {
            let suggestion = self.suggest(name);
            tracing::warn!(suggestion = ?suggestion, "unknown tool");
            return Err(ToolError::not_found(name, suggestion));
        };

        tool.executor.validate_args(&args)?;

        let started = Instant::now();
        let result = match tokio::time::timeout(tool.config.timeout, tool.executor.execute(args)).await
        {
            Ok(result) => result,
            Err(_) => Err(ToolError::timeout(name, tool.config.timeout)),
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(_) => tracing::info!(elapsed_ms, "tool call succeeded"),
            Err(e) if e.is_denied() => {
                tracing::warn!(elapsed_ms, code = e.code(), "tool call denied");
            }
            Err(e) => tracing::warn!(elapsed_ms, code = e.code(), error = %e, "tool call failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::definition::ToolExecutionFuture;
    use crate::tools::error::ToolErrorKind;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Debug)]
    struct EchoTool;

    impl ToolExecutorTrait for EchoTool {
        fn execute(&self, args: Value) -> ToolExecutionFuture {
            Box::pin(async move { Ok(args) })
        }

        fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
            if args.get("reject").is_some() {
                return Err(ToolError::validation_failed("echo", "rejected"));
            }
            Ok(())
        }
    }

    #[derive(Debug)]
    struct SlowTool;

    impl ToolExecutorTrait for SlowTool {
        fn execute(&self, _args: Value) -> ToolExecutionFuture {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Value::Null)
            })
        }
    }

    fn config(name: &str) -> ToolConfig {
        ToolConfig::new(ToolDefinition {
            name: name.to_string(),
            description: format!("{name} tool"),
            input_schema: json!({"type": "object"}),
        })
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(config("echo"), Arc::new(EchoTool)).unwrap();
        registry.register(config("read_file"), Arc::new(EchoTool)).unwrap();
        registry
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = registry();
        let err = registry
            .register(config("echo"), Arc::new(EchoTool))
            .unwrap_err();
        assert!(matches!(err.kind(), ToolErrorKind::AlreadyRegistered { .. }));
        assert_eq!(registry.tool_count(), 2);
    }

    #[test]
    fn definitions_keep_registration_order() {
        let names: Vec<String> = registry().definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "read_file"]);
    }

    #[test]
    fn suggest_finds_close_name() {
        let registry = registry();
        assert_eq!(registry.suggest("read_fil"), Some("read_file".to_string()));
        assert_eq!(registry.suggest("completely_different"), None);
    }

    #[tokio::test]
    async fn execute_runs_tool() {
        let result = registry().execute("echo", json!({"x": 1})).await.unwrap();
        assert_eq!(result, json!({"x": 1}));
    }

    #[tokio::test]
    async fn execute_unknown_tool_suggests_and_tags_request() {
        let err = registry().execute("ecoh", json!({})).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.request_id.is_some());
        assert!(matches!(
            err.kind(),
            ToolErrorKind::NotFound { suggestion: Some(s), .. } if s == "echo"
        ));
    }

    #[tokio::test]
    async fn execute_validates_before_running() {
        let err = registry()
            .execute("echo", json!({"reject": true}))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test(start_paused = true)]
    async fn execute_enforces_timeout() {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                config("slow").with_timeout(Duration::from_secs(5)),
                Arc::new(SlowTool),
            )
            .unwrap();

        let err = registry.execute("slow", json!({})).await.unwrap_err();
        assert!(matches!(err.kind(), ToolErrorKind::Timeout { .. }));
    }
}
