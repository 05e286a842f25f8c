//! JSON-RPC 2.0 and MCP message types.

use crate::tools::{PromptInfo, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC message ID. Can be a string or number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    /// String ID.
    String(String),
    /// Numeric ID.
    Number(i64),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// An incoming request or notification.
///
/// A message without an `id` is a notification and gets no response.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// Protocol version, expected to be "2.0".
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Request ID, absent for notifications.
    #[serde(default)]
    pub id: Option<MessageId>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

impl IncomingMessage {
    /// Returns true if no response is expected.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: Self = Self(-32700);
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: Self = Self(-32600);
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: Self = Self(-32601);
    /// Invalid method parameters.
    pub const INVALID_PARAMS: Self = Self(-32602);
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: Self = Self(-32603);
    /// The requested resource does not exist or may not be read.
    pub const RESOURCE_NOT_FOUND: Self = Self(-32002);
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
}

impl JsonRpcError {
    /// Creates an error with the given code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PARSE_ERROR, message)
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INVALID_REQUEST, message)
    }

    /// Creates a method not found error.
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::METHOD_NOT_FOUND,
            format!("method not found: {method}"),
        )
    }

    /// Creates an invalid params error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INVALID_PARAMS, message)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INTERNAL_ERROR, message)
    }

    /// Creates a resource not found error.
    #[must_use]
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RESOURCE_NOT_FOUND, message)
    }
}

/// JSON-RPC 2.0 response message.
///
/// `id` is serialized as `null` when the request could not be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Request ID this response corresponds to.
    pub id: Option<MessageId>,
    /// Result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Creates a successful response.
    #[must_use]
    pub fn success(id: Option<MessageId>, result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(result) => Self {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(result),
                error: None,
            },
            Err(e) => Self::error(id, JsonRpcError::internal(format!("unserializable result: {e}"))),
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(id: Option<MessageId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Returns true if this is an error response.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Server information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

/// Capabilities advertised at initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Tools capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChanged>,
    /// Prompts capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListChanged>,
    /// Resources capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
}

/// Resources capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    /// Whether subscriptions are supported.
    pub subscribe: bool,
    /// Whether list changed notifications are sent.
    pub list_changed: bool,
}

/// Capability flag shared by tools and prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChanged {
    /// Whether list changed notifications are sent.
    pub list_changed: bool,
}

/// Initialize response result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version the server supports.
    pub protocol_version: String,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
    /// Server information.
    pub server_info: ServerInfo,
    /// Usage instructions for the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// tools/list result.
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResult {
    /// Available tools.
    pub tools: Vec<ToolDefinition>,
}

/// tools/call parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    /// Tool name.
    pub name: String,
    /// Tool arguments; an absent value is treated as `{}`.
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Content types in tool results and prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Text content.
    Text(TextContent),
    /// Base64 image.
    Image(ImageContent),
    /// Embedded resource.
    Resource(ResourceContent),
}

impl Content {
    /// Creates a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextContent { text: text.into() })
    }
}

/// Text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// The text.
    pub text: String,
}

/// Image content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Base64-encoded image data.
    pub data: String,
    /// MIME type of the image.
    pub mime_type: String,
}

/// Resource embedded in a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    /// The resource body.
    pub resource: ResourceContents,
}

/// Resource definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource URI.
    pub uri: String,
    /// Resource name.
    pub name: String,
    /// Resource description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Resource contents; exactly one of `text` and `blob` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// Resource URI.
    pub uri: String,
    /// MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Binary content (base64).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

impl ResourceContents {
    /// Text contents.
    #[must_use]
    pub fn text(uri: impl Into<String>, mime_type: &str, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: Some(mime_type.to_string()),
            text: Some(text.into()),
            blob: None,
        }
    }

    /// Base64 blob contents.
    #[must_use]
    pub fn blob(uri: impl Into<String>, mime_type: &str, blob: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: Some(mime_type.to_string()),
            text: None,
            blob: Some(blob.into()),
        }
    }
}

/// resources/list result.
#[derive(Debug, Clone, Serialize)]
pub struct ListResourcesResult {
    /// Available resources.
    pub resources: Vec<Resource>,
}

/// resources/read parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceParams {
    /// URI to read.
    pub uri: String,
}

/// resources/read result.
#[derive(Debug, Clone, Serialize)]
pub struct ReadResourceResult {
    /// Contents of the resource.
    pub contents: Vec<ResourceContents>,
}

/// tools/call result.
///
/// Tool failures, guard rejections included, are results with `is_error`
/// set, not JSON-RPC errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Result content.
    pub content: Vec<Content>,
    /// Structured form of the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    /// Whether the call failed.
    pub is_error: bool,
}

/// prompts/list result.
#[derive(Debug, Clone, Serialize)]
pub struct ListPromptsResult {
    /// Available prompts.
    pub prompts: Vec<PromptInfo>,
}

/// prompts/get parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct GetPromptParams {
    /// Prompt name.
    pub name: String,
}

/// A message in a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    /// Speaker role.
    pub role: String,
    /// Message content.
    pub content: Content,
}

/// prompts/get result.
#[derive(Debug, Clone, Serialize)]
pub struct GetPromptResult {
    /// What the prompt is for.
    pub description: String,
    /// Prompt messages.
    pub messages: Vec<PromptMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_id_accepts_strings_and_numbers() {
        let n: MessageId = serde_json::from_value(json!(7)).unwrap();
        let s: MessageId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(n, MessageId::Number(7));
        assert_eq!(s, MessageId::String("abc".to_string()));
    }

    #[test]
    fn message_without_id_is_notification() {
        let msg: IncomingMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                .unwrap();
        assert!(msg.is_notification());
    }

    #[test]
    fn error_response_keeps_null_id() {
        let response = JsonRpcResponse::error(None, JsonRpcError::parse_error("bad"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], -32700);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn call_tool_result_uses_camel_case() {
        let result = CallToolResult {
            content: vec![Content::text("hi")],
            structured_content: None,
            is_error: true,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["type"], "text");
    }

    #[test]
    fn content_blocks_are_tagged_by_type() {
        let image = Content::Image(ImageContent {
            data: "aGk=".to_string(),
            mime_type: "image/png".to_string(),
        });
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value, json!({"type": "image", "data": "aGk=", "mimeType": "image/png"}));

        let resource = Content::Resource(ResourceContent {
            resource: ResourceContents::blob("file:///x.bin", "application/octet-stream", "AA=="),
        });
        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["type"], "resource");
        assert_eq!(value["resource"]["blob"], "AA==");
        assert!(value["resource"].get("text").is_none());
    }
}
