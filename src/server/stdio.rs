//! MCP server over newline-delimited JSON on stdio.

use crate::error::WardenError;
use crate::server::protocol::{
    CallToolParams, CallToolResult, Content, GetPromptParams, GetPromptResult, ImageContent,
    IncomingMessage, InitializeResult, JsonRpcError, JsonRpcResponse, ListChanged,
    ListPromptsResult, ListResourcesResult, ListToolsResult, MessageId, PromptMessage,
    ReadResourceParams, ReadResourceResult, ResourceContent, ResourceContents,
    ResourcesCapability, ServerCapabilities, ServerInfo, PROTOCOL_VERSION,
};
use crate::server::resources::FileResources;
use crate::tools::{Prompts, ToolRegistry};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Semaphore};

/// Responses waiting for the writer task.
const RESPONSE_QUEUE: usize = 64;

/// Requests handled at once; reading pauses while all are busy.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// MCP server exposing the tool registry and prompts.
///
/// Requests are handled concurrently, up to a fixed limit; every task shares
/// the same registry and therefore the same allowlist snapshot. Responses go through a single
/// writer so lines never interleave.
#[derive(Debug)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    prompts: Arc<Prompts>,
    resources: Option<FileResources>,
    info: ServerInfo,
    in_flight: Arc<Semaphore>,
}

impl McpServer {
    /// Creates a server for the given registry and prompts.
    #[must_use]
    pub fn new(registry: ToolRegistry, prompts: Prompts) -> Self {
        Self {
            registry: Arc::new(registry),
            prompts: Arc::new(prompts),
            resources: None,
            info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            in_flight: Arc::new(Semaphore::new(DEFAULT_MAX_IN_FLIGHT)),
        }
    }

    /// Serves the allowed directories as `file://` resources.
    #[must_use]
    pub fn with_resources(mut self, resources: FileResources) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Sets how many requests may be handled at once (at least one).
    #[must_use]
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.in_flight = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    /// Serves on the process's stdin and stdout until stdin closes.
    ///
    /// # Errors
    ///
    /// Returns a transport error if stdin cannot be read or stdout written.
    pub async fn serve_stdio(self) -> Result<(), WardenError> {
        let reader = BufReader::new(tokio::io::stdin());
        Arc::new(self).serve(reader, tokio::io::stdout()).await
    }

    /// Serves on any line-oriented reader and writer until the reader ends.
    ///
    /// In-flight requests finish and are answered before this returns.
    ///
    /// # Errors
    ///
    /// Returns a transport error if reading or writing fails.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<(), WardenError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        tracing::info!(
            tools = self.registry.tool_count(),
            "MCP server listening on stdio"
        );

        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_QUEUE);
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let mut lines = reader.lines();
        let read_result = loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break Ok(()),
                Err(e) => break Err(WardenError::transport(format!("failed to read request: {e}"))),
            };
            if line.trim().is_empty() {
                continue;
            }

            let permit = match Arc::clone(&self.in_flight).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => break Err(WardenError::transport(format!("request limiter closed: {e}"))),
            };
            let server = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _permit = permit;
                if let Some(response) = server.handle_line(&line).await {
                    if tx.send(response).await.is_err() {
                        tracing::warn!("response dropped; writer has stopped");
                    }
                }
            });
        };

        drop(tx);
        let write_result = writer_task
            .await
            .map_err(|e| WardenError::transport(format!("writer task failed: {e}")))?;

        tracing::info!("MCP server stopped");
        read_result.and(write_result)
    }

    /// Handles one line of input, returning the response to send, if any.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable message");
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("parse error: {e}")),
                ));
            }
        };

        if value.get("method").is_none() {
            if value.get("result").is_some() || value.get("error").is_some() {
                tracing::debug!("ignoring response message");
                return None;
            }
            let id = value
                .get("id")
                .and_then(|id| serde_json::from_value::<MessageId>(id.clone()).ok());
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("message has no method"),
            ));
        }

        let message: IncomingMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::invalid_request(e.to_string()),
                ));
            }
        };

        if message.is_notification() {
            tracing::debug!(method = %message.method, "notification received");
            return None;
        }

        Some(self.handle_request(message).await)
    }

    /// Handles a request that expects a response.
    pub async fn handle_request(&self, request: IncomingMessage) -> JsonRpcResponse {
        tracing::debug!(method = %request.method, id = ?request.id, "handling request");
        let id = request.id;

        match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.definitions(),
                },
            ),
            "tools/call" => match params::<CallToolParams>(request.params) {
                Ok(params) => JsonRpcResponse::success(id, self.call_tool(params).await),
                Err(e) => JsonRpcResponse::error(id, e),
            },
            "prompts/list" => JsonRpcResponse::success(
                id,
                ListPromptsResult {
                    prompts: self.prompts.list(),
                },
            ),
            "resources/list" => match self.resources {
                Some(ref resources) => JsonRpcResponse::success(
                    id,
                    ListResourcesResult {
                        resources: resources.list(),
                    },
                ),
                None => JsonRpcResponse::error(id, JsonRpcError::method_not_found("resources/list")),
            },
            "resources/read" => match (&self.resources, params::<ReadResourceParams>(request.params)) {
                (None, _) => JsonRpcResponse::error(id, JsonRpcError::method_not_found("resources/read")),
                (Some(_), Err(e)) => JsonRpcResponse::error(id, e),
                (Some(resources), Ok(params)) => match resources.read(&params.uri).await {
                    Ok(contents) => JsonRpcResponse::success(id, ReadResourceResult { contents }),
                    Err(e) => {
                        tracing::warn!(uri = %params.uri, error = %e.message, "resource read failed");
                        JsonRpcResponse::error(id, e)
                    }
                },
            },
            "prompts/get" => match params::<GetPromptParams>(request.params) {
                Ok(params) => match self.get_prompt(&params.name) {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(e) => JsonRpcResponse::error(id, e),
                },
                Err(e) => JsonRpcResponse::error(id, e),
            },
            method => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        }
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ListChanged::default()),
                prompts: Some(ListChanged::default()),
                resources: self.resources.as_ref().map(|_| ResourcesCapability::default()),
            },
            server_info: self.info.clone(),
            instructions: None,
        }
    }

    async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
        let args = params.arguments.unwrap_or_else(|| json!({}));

        match self.registry.execute(&params.name, args).await {
            Ok(output) => {
                let (content, structured) = tool_content(output);
                CallToolResult {
                    content,
                    structured_content: Some(structured),
                    is_error: false,
                }
            }
            Err(e) => CallToolResult {
                content: vec![Content::text(e.to_string())],
                structured_content: Some(json!({
                    "error": {
                        "code": e.code(),
                        "message": e.to_string()
                    }
                })),
                is_error: true,
            },
        }
    }

    fn get_prompt(&self, name: &str) -> Result<GetPromptResult, JsonRpcError> {
        let prompt = self
            .prompts
            .get(name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("unknown prompt: {name}")))?;

        Ok(GetPromptResult {
            description: prompt.info.description.clone(),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: Content::text(prompt.text.clone()),
            }],
        })
    }
}

/// Content blocks for a tool result.
///
/// Base64 file data becomes an image or embedded blob block and is left out
/// of the structured form; everything else is rendered as pretty JSON.
fn tool_content(mut output: Value) -> (Vec<Content>, Value) {
    let kind = output["kind"].as_str().unwrap_or_default().to_string();
    if kind == "image" || kind == "binary" {
        if let Some(Value::String(data)) = output.as_object_mut().and_then(|o| o.remove("data")) {
            let mime = output["mime_type"]
                .as_str()
                .unwrap_or("application/octet-stream")
                .to_string();
            let message = output["message"].as_str().unwrap_or_default().to_string();
            let block = if kind == "image" {
                Content::Image(ImageContent {
                    data,
                    mime_type: mime,
                })
            } else {
                let uri = output["uri"].as_str().unwrap_or_default().to_string();
                Content::Resource(ResourceContent {
                    resource: ResourceContents::blob(uri, &mime, data),
                })
            };
            return (vec![Content::text(message), block], output);
        }
    }

    let text = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
    (vec![Content::text(text)], output)
}

fn params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

async fn write_responses<W>(
    mut rx: mpsc::Receiver<JsonRpcResponse>,
    mut writer: W,
) -> Result<(), WardenError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_string(&response)
            .map_err(|e| WardenError::transport(format!("failed to encode response: {e}")))?;
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| WardenError::transport(format!("failed to write response: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| WardenError::transport(format!("failed to flush response: {e}")))?;
    }
    Ok(())
}
