//! OpenAPI Explorer - MCP server for browsing an OpenAPI description
//!
//! Loads one OpenAPI 3.x document (optionally at startup) and answers
//! queries about its operations and schemas through MCP tools.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use openapi_index::{SchemaStore, DEFAULT_CHUNK_SIZE};
use openapi_mcp_server::{McpServer, ServerConfig, ServerMode, DEFAULT_PORT};

/// Explore OpenAPI descriptions through MCP tools
#[derive(Parser, Debug)]
#[command(name = "openapi-explorer")]
#[command(author = "Symbia Labs")]
#[command(version)]
#[command(about = "Explore OpenAPI 3.x descriptions through MCP tools")]
struct Args {
    /// OpenAPI document (file path or URL) to load at startup
    #[arg(long, env = "OPENAPI_SPEC_PATH")]
    spec: Option<String>,

    /// Run in stdio mode (the default)
    #[arg(long, conflicts_with = "http")]
    stdio: bool,

    /// Run in HTTP mode
    #[arg(long)]
    http: bool,

    /// Port for the HTTP server
    #[arg(long, env = "OPENAPI_EXPLORER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Default chunk size, in characters, for paginated tool output
    #[arg(long, env = "OPENAPI_EXPLORER_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

impl Args {
    fn config(&self) -> ServerConfig {
        ServerConfig {
            spec_path: self.spec.clone(),
            port: self.port,
            chunk_size: self.chunk_size,
            ..Default::default()
        }
    }

    fn mode(&self) -> ServerMode {
        if self.http {
            ServerMode::Http
        } else {
            ServerMode::Stdio
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the protocol in stdio mode
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(SchemaStore::new().context("Failed to create HTTP client")?);
    let server = McpServer::new(store, args.config()).with_mode(args.mode());

    if args.spec.is_none() {
        info!("No document configured; waiting for load_spec");
    }
    server.preload().await;

    server.run().await.context("MCP server stopped with an error")?;

    Ok(())
}
