//! MCP request handler

use openapi_index::SchemaStore;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::capabilities::ServerCapabilities;
use super::types::*;
use crate::config::ServerConfig;
use crate::tools::{ToolExecutor, ToolRegistry};

/// Handler for MCP requests
pub struct RequestHandler {
    /// Tool definitions
    registry: ToolRegistry,
    /// Tool executor, bound to the shared store
    executor: ToolExecutor,
    server_name: String,
    server_version: String,
    /// Whether the session is initialized
    initialized: AtomicBool,
}

impl RequestHandler {
    pub fn new(store: Arc<SchemaStore>, config: &ServerConfig) -> Self {
        Self {
            registry: ToolRegistry::new(),
            executor: ToolExecutor::new(store, config.chunk_size),
            server_name: config.server_name.clone(),
            server_version: config.server_version.clone(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Handle an incoming message
    pub async fn handle(&self, message: McpMessage) -> Option<McpMessage> {
        match (message.method.as_deref(), message.id.clone()) {
            (Some(method), Some(id)) => {
                debug!("Handling request: {}", method);

                let result = match method {
                    "initialize" => self.handle_initialize(message.params),
                    "ping" => Ok(serde_json::json!({})),
                    "tools/list" => self.handle_tools_list(),
                    "tools/call" => self.handle_tools_call(message.params).await,
                    _ => Err(McpError::method_not_found()),
                };

                Some(match result {
                    Ok(result) => McpMessage::response(id, result),
                    Err(error) => McpMessage::error_response(Some(id), error),
                })
            }
            (Some(method), None) => {
                match method {
                    "notifications/initialized" | "initialized" => info!("Client initialized"),
                    "notifications/cancelled" => debug!("Request cancelled"),
                    _ => debug!("Unknown notification: {}", method),
                }
                None
            }
            _ => {
                // Responses are not expected in server mode
                debug!("Received unexpected response");
                None
            }
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::invalid_params(e.to_string()))?
            .ok_or_else(|| McpError::invalid_params("Missing params"))?;

        info!(
            "Initializing session with client: {} v{}",
            params.client_info.name, params.client_info.version
        );

        self.initialized.store(true, Ordering::Release);

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities::with_tools(),
            server_info: Implementation {
                name: self.server_name.clone(),
                version: self.server_version.clone(),
            },
        };

        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, McpError> {
        let result = ToolsListResult {
            tools: self.registry.tools().to_vec(),
        };
        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }

    /// Tool failures become error results, never protocol errors
    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::invalid_params(e.to_string()))?
            .ok_or_else(|| McpError::invalid_params("Missing params"))?;

        debug!("Calling tool: {}", params.name);

        let result = match self.executor.execute(&params.name, params.arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool {} failed: {}", params.name, e);
                ToolCallResult::error(e.to_string())
            }
        };

        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }
}
