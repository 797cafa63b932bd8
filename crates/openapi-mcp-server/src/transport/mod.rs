//! Transport implementations for the MCP server

mod http;
mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

use async_trait::async_trait;

/// A way of exchanging MCP messages with a client
#[async_trait]
pub trait Transport: Send {
    /// Serve until the client goes away or the listener fails
    async fn run(&mut self) -> std::io::Result<()>;
}
