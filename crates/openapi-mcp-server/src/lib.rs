//! # openapi-mcp-server
//!
//! MCP (Model Context Protocol) server that exposes one loaded OpenAPI
//! description as a set of query tools. Supports stdio and HTTP transports.

mod config;
pub mod protocol;
mod server;
pub mod tools;
pub mod transport;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use protocol::{McpError, McpMessage, RequestHandler, ServerCapabilities};
pub use server::{McpServer, ServerMode};
pub use tools::{ToolError, ToolExecutor, ToolRegistry};
pub use transport::{HttpTransport, StdioTransport, Transport};
