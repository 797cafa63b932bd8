//! Type definitions for dereferenced API descriptions

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::schema::{SchemaArena, SchemaId};

/// HTTP methods recognized on a path item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Lowercase key as it appears on a path item
    pub fn as_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }

    /// Exact match on a path-item key; anything else is not a method
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_key() == key)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter location in HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

/// A parameter for an API operation
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: Option<String>,
    pub deprecated: bool,
    pub schema: Option<SchemaId>,
    pub example: Option<Value>,
}

/// A named example attached to a media type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// `value` of the example object; `externalValue` is carried as a string
    /// when no inline value exists
    pub value: Value,
}

/// One entry of a `content` map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaType {
    pub schema: Option<SchemaId>,
    pub example: Option<Value>,
    pub examples: IndexMap<String, Example>,
}

/// Request body of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub description: Option<String>,
    pub required: bool,
    /// Keyed by content type, in source order
    pub content: IndexMap<String, MediaType>,
}

/// One response of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub description: Option<String>,
    pub content: IndexMap<String, MediaType>,
}

/// Alternatives are listed separately; the schemes inside one requirement
/// must all be satisfied together.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Server entry from the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Security scheme definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SecurityScheme {
    /// API key authentication
    ApiKey { name: String, location: ParameterLocation },
    /// HTTP authentication (bearer, basic)
    Http {
        scheme: String,
        bearer_format: Option<String>,
    },
    /// OAuth2 authentication; scopes of every flow, first-seen order
    OAuth2 { scopes: IndexMap<String, String> },
    /// OpenID Connect
    OpenIdConnect { openid_connect_url: String },
}

impl SecurityScheme {
    /// Short human-readable summary
    pub fn describe(&self) -> String {
        match self {
            SecurityScheme::ApiKey { name, location } => {
                format!("API key '{}' in {}", name, location.as_str())
            }
            SecurityScheme::Http {
                scheme,
                bearer_format: Some(format),
            } => format!("HTTP {} ({})", scheme, format),
            SecurityScheme::Http { scheme, .. } => format!("HTTP {}", scheme),
            SecurityScheme::OAuth2 { scopes } if scopes.is_empty() => "OAuth2".to_string(),
            SecurityScheme::OAuth2 { scopes } => format!(
                "OAuth2 (scopes: {})",
                scopes.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
            SecurityScheme::OpenIdConnect { openid_connect_url } => {
                format!("OpenID Connect ({})", openid_connect_url)
            }
        }
    }
}

/// `info` block of the document
#[derive(Debug, Clone, PartialEq)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// An operation as written in the document, before extraction
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDef {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub responses: IndexMap<String, Response>,
    pub security: Option<Vec<SecurityRequirement>>,
    pub servers: Option<Vec<ServerInfo>>,
}

/// A path item; `operations` is keyed by the path-item key it was found under
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathItem {
    pub parameters: Vec<Parameter>,
    pub operations: IndexMap<String, OperationDef>,
}

/// Fully dereferenced API description
#[derive(Debug, Clone)]
pub struct Document {
    /// Version marker (`openapi` field)
    pub openapi: String,
    pub info: ApiInfo,
    pub servers: Vec<ServerInfo>,
    pub paths: IndexMap<String, PathItem>,
    /// Named schemas from `components.schemas`, source order
    pub schemas: IndexMap<String, SchemaId>,
    pub security: Vec<SecurityRequirement>,
    pub security_schemes: IndexMap<String, SecurityScheme>,
    /// Every schema of the document
    pub arena: Arc<SchemaArena>,
}

/// A single API operation extracted from the document
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Operation ID from the source, or `{method}_{path}` when absent
    pub operation_id: String,
    pub method: HttpMethod,
    /// URL path template (e.g., "/v1/customers/{id}")
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    /// Path-item parameters first, then operation parameters
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    /// Keyed by status code string, source order
    pub responses: IndexMap<String, Response>,
    /// Operation security, or the document-global list when none is given
    pub security: Vec<SecurityRequirement>,
    /// Per-operation server override
    pub servers: Option<Vec<ServerInfo>>,
}

/// Metadata recorded for the current generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Location the document was loaded from
    pub path: String,
    pub loaded_at: DateTime<Utc>,
}

// --- Raw OpenAPI 3.x structures for parsing ---
//
// Fields that may hold a `$ref` stay as raw JSON and are dereferenced by the
// resolver before they are deserialized further.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub parameters: Vec<Value>,
    pub request_body: Option<Value>,
    #[serde(default)]
    pub responses: IndexMap<String, Value>,
    pub security: Option<Vec<SecurityRequirement>>,
    pub servers: Option<Vec<ServerInfo>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    pub schema: Option<Value>,
    pub example: Option<Value>,
    /// Alternative to `schema` for complex parameters
    #[serde(default)]
    pub content: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRequestBody {
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawResponse {
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMediaType {
    pub schema: Option<Value>,
    pub example: Option<Value>,
    #[serde(default)]
    pub examples: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExample {
    pub summary: Option<String>,
    pub value: Option<Value>,
    pub external_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub flows: Option<IndexMap<String, RawOAuth2Flow>>,
    pub openid_connect_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOAuth2Flow {
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}
