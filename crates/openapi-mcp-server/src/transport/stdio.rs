//! stdio transport: one JSON-RPC message per line

use async_trait::async_trait;
use openapi_index::SchemaStore;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::Transport;
use crate::config::ServerConfig;
use crate::protocol::{McpError, McpMessage, RequestHandler};

/// stdio transport for MCP protocol
pub struct StdioTransport {
    handler: RequestHandler,
}

impl StdioTransport {
    pub fn new(store: Arc<SchemaStore>, config: &ServerConfig) -> Self {
        Self {
            handler: RequestHandler::new(store, config),
        }
    }

    /// Read messages from `reader` and write responses to `writer` until EOF
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let response = match serde_json::from_str::<McpMessage>(line) {
                Ok(message) => self.handler.handle(message).await,
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    Some(McpMessage::error_response(None, McpError::parse_error()))
                }
            };

            if let Some(response) = response {
                let response_line = serde_json::to_string(&response)?;
                debug!("Sending: {}", response_line);
                writer.write_all(response_line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("EOF received, shutting down");
        Ok(())
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn run(&mut self) -> std::io::Result<()> {
        info!("Starting MCP server on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn test_serve_lines() {
        let store = Arc::new(SchemaStore::new().unwrap());
        store
            .load_str(
                "openapi: '3.0.0'\ninfo: {title: Tiny, version: '1'}\npaths: {}\n",
                "tiny.yaml",
            )
            .unwrap();
        let mut transport = StdioTransport::new(store, &ServerConfig::default());

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"list_tags"}}"#,
            "\n",
        );
        let mut output = Vec::new();
        transport.serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], McpError::PARSE_ERROR);
        assert_eq!(responses[2]["result"]["content"][0]["text"], "No tags defined");
    }
}
