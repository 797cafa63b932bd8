//! HTTP transport: JSON-RPC over POST plus a health probe

use async_trait::async_trait;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use openapi_index::SchemaStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::Transport;
use crate::config::ServerConfig;
use crate::protocol::{McpMessage, RequestHandler};

/// Shared state for HTTP handlers
struct AppState {
    store: Arc<SchemaStore>,
    handler: RequestHandler,
}

/// HTTP transport for MCP protocol
pub struct HttpTransport {
    store: Arc<SchemaStore>,
    config: ServerConfig,
}

impl HttpTransport {
    pub fn new(store: Arc<SchemaStore>, config: ServerConfig) -> Self {
        Self { store, config }
    }

    /// The routes, without binding a socket
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            store: Arc::clone(&self.store),
            handler: RequestHandler::new(Arc::clone(&self.store), &self.config),
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(health))
            .route("/mcp", post(handle_mcp_request))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(state)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn run(&mut self) -> std::io::Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.port);
        info!("Starting MCP HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, self.router()).await
    }
}

/// Health check; also reports whether a document is loaded
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let body = match state.store.metadata() {
        Some(metadata) => json!({
            "status": "ok",
            "loaded": true,
            "title": metadata.title,
            "version": metadata.version,
            "operations": state.store.operation_count(),
        }),
        None => json!({"status": "ok", "loaded": false}),
    };
    Json(body)
}

/// Handle MCP JSON-RPC request via HTTP POST
async fn handle_mcp_request(
    State(state): State<Arc<AppState>>,
    Json(message): Json<McpMessage>,
) -> Json<McpMessage> {
    debug!("HTTP request: {:?}", message.method);

    match state.handler.handle(message).await {
        Some(response) => Json(response),
        // Notification: acknowledge with an empty result
        None => Json(McpMessage::response(Value::Null, json!({}))),
    }
}
