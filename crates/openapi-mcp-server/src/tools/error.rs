//! Tool layer errors

use openapi_index::LoadError;
use thiserror::Error;

pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Failures of a single tool call. They are reported back to the client as
/// an error result rather than a protocol error.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("No API description loaded. Call load_spec with a file path or URL first.")]
    NotLoaded,

    #[error("Failed to load API description: {0}")]
    LoadFailed(#[from] LoadError),

    #[error("Operation not found: {0}")]
    OperationNotFound(String),

    #[error("Schema not found: {name}. Available schemas: {available}")]
    SchemaNotFound { name: String, available: String },

    #[error("Content type {requested} not found. Available: {available}")]
    ContentTypeNotFound { requested: String, available: String },

    #[error("Response {requested} not found. Available: {available}")]
    ResponseNotFound { requested: String, available: String },
}

impl ToolError {
    pub(crate) fn invalid_arguments(tool: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}
