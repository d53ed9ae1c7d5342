//! MCP protocol types based on JSON-RPC 2.0.
//!
//! The Model Context Protocol uses JSON-RPC 2.0 for communication.
//! This module defines the message types for request/response handling.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trackbridge_core::ToolResult;

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version.
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC request message.
///
/// A request without an `id` (or with `"id": null`) is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

impl JsonRpcRequest {
    /// Parse a framed message into a request envelope.
    pub fn parse(message: &str) -> Result<Self, JsonRpcError> {
        serde_json::from_str(message).map_err(|e| JsonRpcError::parse_error(&e.to_string()))
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC response message.
///
/// `id` is serialized as `null` when the request's identifier could not be
/// recovered (parse errors).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(JsonRpcError),
}

/// Request ID - a string or a number, kept exactly as received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(serde_json::Number),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC error codes
impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Upper bound of the implementation-defined server error range.
    pub const SERVER_ERROR_MAX: i32 = -32000;
    /// Lower bound of the implementation-defined server error range.
    pub const SERVER_ERROR_MIN: i32 = -32099;

    pub fn parse_error(msg: &str) -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: format!("Parse error: {}", msg),
            data: None,
        }
    }

    pub fn invalid_request(msg: &str) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: format!("Invalid request: {}", msg),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    pub fn invalid_params(msg: &str) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: format!("Invalid params: {}", msg),
            data: None,
        }
    }

    pub fn internal_error(msg: &str) -> Self {
        Self {
            code: Self::INTERNAL_ERROR,
            message: format!("Internal error: {}", msg),
            data: None,
        }
    }

    /// Error in the server-defined range, clamped into `-32099..=-32000`.
    pub fn server_error(code: i32, msg: &str) -> Self {
        Self {
            code: code.clamp(Self::SERVER_ERROR_MIN, Self::SERVER_ERROR_MAX),
            message: msg.to_string(),
            data: None,
        }
    }

    /// Attach structured detail.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl JsonRpcResponse {
    /// Create a successful response.
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Result(result),
        }
    }

    /// Create an error response.
    pub fn error(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Error(error),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(value) => Some(value),
            ResponsePayload::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            ResponsePayload::Result(_) => None,
            ResponsePayload::Error(error) => Some(error),
        }
    }
}

// ============================================================================
// MCP-specific types
// ============================================================================

/// Protocol methods understood by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ToolsList,
    ToolsCall,
    Ping,
    Initialized,
    Cancelled,
    Unknown(String),
}

impl From<&str> for Method {
    fn from(method: &str) -> Self {
        match method {
            "initialize" => Method::Initialize,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            "ping" => Method::Ping,
            "notifications/initialized" | "initialized" => Method::Initialized,
            "notifications/cancelled" => Method::Cancelled,
            other => Method::Unknown(other.to_string()),
        }
    }
}

/// MCP initialization request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub client_info: ClientInfo,
}

/// Client info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// MCP initialization response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

/// Server capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

/// Server info.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Tool definition for tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tools list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDefinition>,
}

/// Tool call request params.
///
/// Both fields are optional here so that a missing `name` or `arguments`
/// can be reported as invalid params rather than a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Tool call result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ToolResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content in tool result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ToolResultContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResult {
    /// Create a successful text result.
    pub fn text(content: String) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: content }],
            structured_content: None,
            is_error: None,
        }
    }

    /// Create an error result.
    pub fn error(message: String) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: message }],
            structured_content: None,
            is_error: Some(true),
        }
    }

    /// Text of the first content block.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            ToolResultContent::Text { text } => text.as_str(),
        })
    }
}

impl From<ToolResult> for ToolCallResult {
    fn from(result: ToolResult) -> Self {
        match result {
            ToolResult::Success(Value::String(text)) => ToolCallResult::text(text),
            ToolResult::Success(payload) => {
                let text = serde_json::to_string_pretty(&payload).unwrap_or_default();
                ToolCallResult {
                    structured_content: Some(payload),
                    ..ToolCallResult::text(text)
                }
            }
            ToolResult::Failure { message, code } => {
                let structured = code.map(|code| {
                    serde_json::json!({
                        "code": code,
                        "message": message.clone(),
                    })
                });
                ToolCallResult {
                    structured_content: structured,
                    ..ToolCallResult::error(message)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let req = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(RequestId::Number(1i64.into())),
            method: "initialize".to_string(),
            params: Some(json!({"test": true})),
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn test_parse_request_and_notification() {
        let req = JsonRpcRequest::parse(r#"{"jsonrpc":"2.0","id":"a-1","method":"ping"}"#).unwrap();
        assert_eq!(req.id, Some(RequestId::String("a-1".to_string())));
        assert!(!req.is_notification());

        let notif =
            JsonRpcRequest::parse(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(notif.is_notification());

        let null_id = JsonRpcRequest::parse(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(null_id.is_notification());
    }

    #[test]
    fn test_parse_failures() {
        let err = JsonRpcRequest::parse("{not json").unwrap_err();
        assert_eq!(err.code, JsonRpcError::PARSE_ERROR);

        let err = JsonRpcRequest::parse(r#"{"jsonrpc":"2.0","id":3}"#).unwrap_err();
        assert_eq!(err.code, JsonRpcError::PARSE_ERROR);
        assert!(err.message.contains("method"));
    }

    #[test]
    fn test_parse_defaults_missing_tag() {
        let req = JsonRpcRequest::parse(r#"{"id":2,"method":"tools/list"}"#).unwrap();
        assert_eq!(req.jsonrpc, JSONRPC_VERSION);
    }

    #[test]
    fn test_response_success() {
        let resp = JsonRpcResponse::success(
            Some(RequestId::String("abc".to_string())),
            json!({"result": "ok"}),
        );

        assert!(resp.error_object().is_none());
        assert!(resp.result().is_some());

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["id"], "abc");
        assert!(value.get("error").is_none());
        assert_eq!(value["result"]["result"], "ok");
    }

    #[test]
    fn test_response_error() {
        let resp = JsonRpcResponse::error(
            Some(RequestId::Number(1i64.into())),
            JsonRpcError::method_not_found("test"),
        );

        assert!(resp.result().is_none());
        assert_eq!(
            resp.error_object().unwrap().code,
            JsonRpcError::METHOD_NOT_FOUND
        );

        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
    }

    #[test]
    fn test_parse_error_response_has_null_id() {
        let resp = JsonRpcResponse::error(None, JsonRpcError::parse_error("bad json"));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"id\":null"));
    }

    #[test]
    fn test_server_error_clamped() {
        assert_eq!(JsonRpcError::server_error(-32010, "x").code, -32010);
        assert_eq!(JsonRpcError::server_error(1, "x").code, -32000);
        assert_eq!(JsonRpcError::server_error(-40000, "x").code, -32099);
    }

    #[test]
    fn test_error_with_data() {
        let err = JsonRpcError::invalid_params("missing field").with_data(json!({"field": "name"}));
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"field\":\"name\""));
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!(Method::from("initialize"), Method::Initialize);
        assert_eq!(Method::from("tools/call"), Method::ToolsCall);
        assert_eq!(Method::from("initialized"), Method::Initialized);
        assert_eq!(Method::from("notifications/initialized"), Method::Initialized);
        assert_eq!(
            Method::from("resources/list"),
            Method::Unknown("resources/list".to_string())
        );
    }

    #[test]
    fn test_tool_call_result() {
        let result = ToolCallResult::text("Hello".to_string());
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"type\":\"text\""));
        assert!(json.contains("\"text\":\"Hello\""));
        assert!(!json.contains("isError"));
    }

    #[test]
    fn test_tool_call_result_from_structured_success() {
        let result = ToolCallResult::from(ToolResult::success(json!({"id": "ISS-1"})));
        assert_eq!(result.structured_content, Some(json!({"id": "ISS-1"})));
        assert!(result.first_text().unwrap().contains("ISS-1"));
        assert!(result.is_error.is_none());
    }

    #[test]
    fn test_tool_call_result_from_failure() {
        let result = ToolCallResult::from(ToolResult::failure_with_code("Team not found", -32004));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.first_text(), Some("Team not found"));
        assert_eq!(result.structured_content.unwrap()["code"], -32004);

        let plain = ToolCallResult::from(ToolResult::failure("boom"));
        assert!(plain.structured_content.is_none());
    }

    #[test]
    fn test_request_id_variants() {
        assert_eq!(serde_json::to_string(&RequestId::Number(42i64.into())).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&RequestId::String("abc".to_string())).unwrap(),
            "\"abc\""
        );
        assert_eq!(RequestId::Number(7i64.into()).to_string(), "7");
    }

    #[test]
    fn test_parse_fractional_and_wide_ids() {
        let req = JsonRpcRequest::parse(r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#).unwrap();
        let id = req.id.unwrap();
        assert_eq!(id.to_string(), "1.5");
        assert_eq!(serde_json::to_string(&id).unwrap(), "1.5");

        let req =
            JsonRpcRequest::parse(r#"{"jsonrpc":"2.0","id":18446744073709551615,"method":"ping"}"#)
                .unwrap();
        assert_eq!(
            serde_json::to_string(&req.id.unwrap()).unwrap(),
            "18446744073709551615"
        );
    }
}
