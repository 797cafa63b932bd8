//! Error types for loading API descriptions

use thiserror::Error;

/// Result type alias for load operations
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Failures raised while turning a source file into a generation.
///
/// Lookups never produce these: a missing operation or schema is an absent
/// result, not an error.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read API description from {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch API description: {0}")]
    FetchError(String),

    #[error("Invalid API description format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("Unresolvable reference '{reference}': {reason}")]
    UnresolvedReference { reference: String, reason: String },

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl LoadError {
    pub(crate) fn unresolved(reference: &str, reason: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}
