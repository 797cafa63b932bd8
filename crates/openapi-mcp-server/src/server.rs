//! Server orchestration

use openapi_index::SchemaStore;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::transport::{HttpTransport, StdioTransport, Transport};

/// Server mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// stdio transport (for desktop MCP clients)
    #[default]
    Stdio,
    /// HTTP transport on `ServerConfig::port`
    Http,
}

/// MCP server over one shared schema store
pub struct McpServer {
    store: Arc<SchemaStore>,
    config: ServerConfig,
    mode: ServerMode,
}

impl McpServer {
    pub fn new(store: Arc<SchemaStore>, config: ServerConfig) -> Self {
        Self {
            store,
            config,
            mode: ServerMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Load the configured document, if any. A failure is logged and the
    /// server starts empty; clients can still call `load_spec`.
    pub async fn preload(&self) -> bool {
        let Some(path) = &self.config.spec_path else {
            return false;
        };
        match self.store.load(path).await {
            Ok(metadata) => {
                info!("Serving {} v{}", metadata.title, metadata.version);
                true
            }
            Err(e) => {
                warn!("Could not load {}: {}", path, e);
                false
            }
        }
    }

    /// Run the server until the transport stops
    pub async fn run(&self) -> std::io::Result<()> {
        let mut transport: Box<dyn Transport> = match self.mode {
            ServerMode::Stdio => {
                info!("Starting MCP server in stdio mode");
                Box::new(StdioTransport::new(Arc::clone(&self.store), &self.config))
            }
            ServerMode::Http => {
                info!("Starting MCP server in HTTP mode on port {}", self.config.port);
                Box::new(HttpTransport::new(Arc::clone(&self.store), self.config.clone()))
            }
        };
        transport.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_preload() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"openapi": "3.1.0", "info": {{"title": "Json", "version": "3"}}, "paths": {{}}}}"#).unwrap();

        let store = Arc::new(SchemaStore::new().unwrap());
        let config = ServerConfig {
            spec_path: Some(file.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        let server = McpServer::new(Arc::clone(&store), config);
        assert!(server.preload().await);
        assert_eq!(store.metadata().unwrap().title, "Json");
    }

    #[tokio::test]
    async fn test_preload_failure_leaves_store_empty() {
        let store = Arc::new(SchemaStore::new().unwrap());
        let config = ServerConfig {
            spec_path: Some("/no/such/spec.json".to_string()),
            ..Default::default()
        };
        assert!(!McpServer::new(Arc::clone(&store), config).preload().await);
        assert!(!store.has_schema());

        let server = McpServer::new(store, ServerConfig::default());
        assert!(!server.preload().await);
    }
}
