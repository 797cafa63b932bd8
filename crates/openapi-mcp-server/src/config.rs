//! Server configuration

use openapi_index::DEFAULT_CHUNK_SIZE;

/// Default port for the HTTP transport
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime settings shared by the transports and the tool layer
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Document to load at startup
    pub spec_path: Option<String>,
    pub port: u16,
    /// Chunk size used when a tool call does not pass one
    pub chunk_size: usize,
    pub server_name: String,
    pub server_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            spec_path: None,
            port: DEFAULT_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            server_name: "OpenAPI Explorer".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
