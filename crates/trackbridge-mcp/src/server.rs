//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. List and call tools from the registry
//! 3. Stop when the client closes stdin
//!
//! Messages are handled strictly one at a time. A response is written only
//! for requests that carry an `id`; notifications are never answered.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use trackbridge_core::Result;

use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, Method,
    RequestId, ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult, ToolsCapability,
    ToolsListResult, JSONRPC_VERSION, MCP_VERSION,
};
use crate::registry::ToolRegistry;
use crate::transport::{FramingError, StdioTransport};

/// MCP server for trackbridge.
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
}

impl McpServer {
    /// Create a new MCP server over a populated registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            server_info: ServerInfo {
                name: "trackbridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Override the name advertised in `serverInfo`.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_info.name = name.into();
        self
    }

    /// Get the tool registry.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run the MCP server on stdin/stdout.
    pub async fn run(&self) -> Result<()> {
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Serve a session until end of stream or a failed read.
    pub async fn serve(&self, transport: &mut StdioTransport) -> Result<()> {
        tracing::info!("Starting MCP server with {} tools", self.registry.len());

        loop {
            match transport.read_message() {
                Ok(Some(message)) => {
                    let Some(response) = self.handle_message(&message).await else {
                        continue;
                    };
                    let json = serde_json::to_string(&response)?;
                    if let Err(e) = transport.write_message(&json) {
                        tracing::error!("Failed to write response: {}", e);
                        break;
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(FramingError::Io(e)) => {
                    tracing::error!("Failed to read from transport: {}", e);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Transport error: {}", e);
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle one framed message and return the response to write, if any.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request = match JsonRpcRequest::parse(message) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!("Failed to parse message: {}", error.message);
                // The id of an unparseable message cannot be trusted
                return Some(JsonRpcResponse::error(None, error));
            }
        };

        let id = request.id.clone();
        let response = self.dispatch(request).await;

        match id {
            Some(_) => response,
            None => {
                if let Some(suppressed) = response {
                    tracing::debug!("Not answering notification: {:?}", suppressed.payload);
                }
                None
            }
        }
    }

    /// Route a parsed request to its handler.
    ///
    /// `None` means no response is due.
    pub async fn dispatch(&self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Handling request: {} (id: {:?})", req.method, req.id);

        if req.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                req.id,
                JsonRpcError::invalid_request(&format!(
                    "unsupported jsonrpc version {:?}",
                    req.jsonrpc
                )),
            ));
        }

        let response = match Method::from(req.method.as_str()) {
            Method::Initialize => self.handle_initialize(req.id, req.params),
            Method::ToolsList => self.handle_tools_list(req.id),
            Method::ToolsCall => self.handle_tools_call(req.id, req.params).await,
            Method::Ping => self.handle_ping(req.id),
            method @ (Method::Initialized | Method::Cancelled) => {
                self.handle_notification(&method, req.params.as_ref());
                return req
                    .id
                    .map(|id| JsonRpcResponse::success(Some(id), serde_json::json!({})));
            }
            Method::Unknown(method) => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(&method))
            }
        };

        Some(response)
    }

    /// Handle notifications (no response).
    fn handle_notification(&self, method: &Method, params: Option<&Value>) {
        match method {
            Method::Initialized => {
                tracing::info!("Client initialized");
            }
            Method::Cancelled => {
                let request_id = params.and_then(|p| p.get("requestId"));
                tracing::debug!("Request cancelled by client: {:?}", request_id);
            }
            other => {
                tracing::debug!("Ignoring notification: {:?}", other);
            }
        }
    }

    /// Handle initialize request.
    fn handle_initialize(&self, id: Option<RequestId>, params: Option<Value>) -> JsonRpcResponse {
        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init_params) => {
                    tracing::info!(
                        "Client: {} v{} (protocol: {})",
                        init_params.client_info.name,
                        init_params.client_info.version,
                        init_params.protocol_version
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to parse initialize params: {}", e);
                }
            }
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.server_info.clone(),
        };

        respond(id, &result)
    }

    /// Handle tools/list request.
    fn handle_tools_list(&self, id: Option<RequestId>) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.registry.schema_list(),
        };
        respond(id, &result)
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&self, id: Option<RequestId>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, JsonRpcError::invalid_params(&e.to_string()));
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        let Some(name) = params.name else {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing tool name"));
        };
        let arguments = match params.arguments {
            Some(arguments @ Value::Object(_)) => arguments,
            Some(_) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("arguments must be an object"),
                );
            }
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing arguments"));
            }
        };

        tracing::info!("Calling tool: {}", name);

        // Run on its own task so a panicking body surfaces as a JoinError
        // instead of unwinding through the server loop.
        let registry = Arc::clone(&self.registry);
        let tool_name = name.clone();
        let outcome = tokio::spawn(async move { registry.invoke(&tool_name, arguments).await }).await;

        match outcome {
            Ok(result) => respond(id, &ToolCallResult::from(result)),
            Err(e) if e.is_panic() => {
                tracing::error!("Tool {} panicked", name);
                JsonRpcResponse::error(
                    id,
                    JsonRpcError::internal_error(&format!("tool '{}' panicked", name)),
                )
            }
            Err(e) => {
                tracing::error!("Tool {} did not complete: {}", name, e);
                JsonRpcResponse::error(id, JsonRpcError::internal_error(&e.to_string()))
            }
        }
    }

    /// Handle ping request.
    fn handle_ping(&self, id: Option<RequestId>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, serde_json::json!({}))
    }
}

/// Serialize a result payload into a success response.
fn respond<T: Serialize>(id: Option<RequestId>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(&e.to_string())),
    }
}
