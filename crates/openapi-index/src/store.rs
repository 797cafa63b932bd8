//! The schema store: one loaded document at a time

use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::LoadResult;
use crate::examples::ExampleIndex;
use crate::operations::OperationExtractor;
use crate::parser::DocumentParser;
use crate::resolver::resolve_document;
use crate::schema::{Schema, SchemaId};
use crate::source::{DefaultSource, DocumentSource};
use crate::types::*;

/// How to identify an operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationQuery {
    pub operation_id: Option<String>,
    pub method: Option<HttpMethod>,
    pub path: Option<String>,
}

impl OperationQuery {
    pub fn by_id(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: Some(operation_id.into()),
            ..Default::default()
        }
    }

    pub fn by_route(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Outcome of asking for an operation's request schema
#[derive(Debug, Clone)]
pub enum RequestSchemaLookup {
    OperationNotFound,
    NoRequestBody,
    ContentTypeNotFound {
        requested: String,
        available: Vec<String>,
    },
    Found {
        content_type: String,
        required: bool,
        schema: Option<Schema>,
    },
}

/// Outcome of asking for an operation's response schema
#[derive(Debug, Clone)]
pub enum ResponseSchemaLookup {
    OperationNotFound,
    StatusNotFound {
        requested: Option<String>,
        available: Vec<String>,
    },
    NoContent {
        status: String,
        description: Option<String>,
    },
    ContentTypeNotFound {
        status: String,
        requested: String,
        available: Vec<String>,
    },
    Found {
        status: String,
        description: Option<String>,
        content_type: String,
        schema: Option<Schema>,
    },
}

/// One complete load: the document plus everything derived from it.
///
/// Built in full before it is installed, and never modified afterwards.
#[derive(Debug)]
pub struct Generation {
    pub document: Document,
    pub operations: Vec<Operation>,
    pub examples: ExampleIndex,
    pub metadata: Metadata,
}

impl Generation {
    /// Parse, resolve, extract and index a document
    pub fn build(content: &str, origin: &str) -> LoadResult<Self> {
        let root = DocumentParser::parse(content)?;
        let document = resolve_document(&root)?;
        let operations = OperationExtractor::extract(&document);
        let examples = ExampleIndex::build(&operations);
        debug!(
            "Extracted {} operations and {} examples",
            operations.len(),
            examples.len()
        );

        let metadata = Metadata {
            title: document.info.title.clone(),
            version: document.info.version.clone(),
            description: document.info.description.clone(),
            path: origin.to_string(),
            loaded_at: Utc::now(),
        };

        Ok(Self {
            document,
            operations,
            examples,
            metadata,
        })
    }

    /// Wrap a schema id of this generation's arena
    pub fn schema(&self, id: SchemaId) -> Schema {
        Schema::new(Arc::clone(&self.document.arena), id)
    }

    /// First operation matching the query. The id wins when both forms are
    /// given; the route is only consulted when the id matches nothing.
    pub fn find_operation(&self, query: &OperationQuery) -> Option<&Operation> {
        if let Some(id) = &query.operation_id {
            if let Some(op) = self.operations.iter().find(|op| &op.operation_id == id) {
                return Some(op);
            }
        }
        match (query.method, &query.path) {
            (Some(method), Some(path)) => self
                .operations
                .iter()
                .find(|op| op.method == method && &op.path == path),
            _ => None,
        }
    }

    /// Operations whose method, path, summary or any tag contains the filter,
    /// ignoring case. No filter (or an empty one) returns everything.
    pub fn find_operations(&self, filter: Option<&str>) -> Vec<&Operation> {
        let needle = filter.unwrap_or("").to_lowercase();
        if needle.is_empty() {
            return self.operations.iter().collect();
        }

        self.operations
            .iter()
            .filter(|op| {
                op.method.as_str().to_lowercase().contains(&needle)
                    || op.path.to_lowercase().contains(&needle)
                    || op
                        .summary
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                    || op.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn get_schema(&self, name: &str) -> Option<Schema> {
        self.document.schemas.get(name).map(|id| self.schema(*id))
    }

    pub fn schema_names(&self) -> Vec<String> {
        self.document.schemas.keys().cloned().collect()
    }

    /// Tags with the number of operations carrying them, first-seen order
    pub fn tags(&self) -> IndexMap<String, usize> {
        let mut tags = IndexMap::new();
        for tag in self.operations.iter().flat_map(|op| op.tags.iter()) {
            *tags.entry(tag.clone()).or_insert(0) += 1;
        }
        tags
    }

    pub fn request_schema(
        &self,
        operation_id: &str,
        content_type: Option<&str>,
    ) -> RequestSchemaLookup {
        let Some(op) = self.find_operation(&OperationQuery::by_id(operation_id)) else {
            return RequestSchemaLookup::OperationNotFound;
        };
        let Some(body) = &op.request_body else {
            return RequestSchemaLookup::NoRequestBody;
        };
        if body.content.is_empty() {
            return RequestSchemaLookup::NoRequestBody;
        }

        match pick_content(&body.content, content_type) {
            Ok((content_type, media)) => RequestSchemaLookup::Found {
                content_type: content_type.clone(),
                required: body.required,
                schema: media.schema.map(|id| self.schema(id)),
            },
            Err(available) => RequestSchemaLookup::ContentTypeNotFound {
                requested: content_type.unwrap_or_default().to_string(),
                available,
            },
        }
    }

    pub fn response_schema(
        &self,
        operation_id: &str,
        status: Option<&str>,
        content_type: Option<&str>,
    ) -> ResponseSchemaLookup {
        let Some(op) = self.find_operation(&OperationQuery::by_id(operation_id)) else {
            return ResponseSchemaLookup::OperationNotFound;
        };

        let picked = match status {
            Some(status) => op.responses.get_key_value(status),
            None => op
                .responses
                .iter()
                .find(|(code, _)| code.starts_with('2'))
                .or_else(|| op.responses.get_key_value("default"))
                .or_else(|| op.responses.first()),
        };
        let Some((status, response)) = picked else {
            return ResponseSchemaLookup::StatusNotFound {
                requested: status.map(str::to_string),
                available: op.responses.keys().cloned().collect(),
            };
        };

        if response.content.is_empty() {
            return ResponseSchemaLookup::NoContent {
                status: status.clone(),
                description: response.description.clone(),
            };
        }

        match pick_content(&response.content, content_type) {
            Ok((content_type, media)) => ResponseSchemaLookup::Found {
                status: status.clone(),
                description: response.description.clone(),
                content_type: content_type.clone(),
                schema: media.schema.map(|id| self.schema(id)),
            },
            Err(available) => ResponseSchemaLookup::ContentTypeNotFound {
                status: status.clone(),
                requested: content_type.unwrap_or_default().to_string(),
                available,
            },
        }
    }
}

/// The requested content type, or the first one declared
fn pick_content<'c>(
    content: &'c IndexMap<String, MediaType>,
    requested: Option<&str>,
) -> Result<(&'c String, &'c MediaType), Vec<String>> {
    let picked = match requested {
        Some(ct) => content.get_key_value(ct),
        None => content.first(),
    };
    picked.ok_or_else(|| content.keys().cloned().collect())
}

/// Owns the current generation.
///
/// A load builds a complete [`Generation`] off to the side and then swaps the
/// pointer; a failed load leaves the previous generation in place. Concurrent
/// loads resolve last writer wins. Reads take a snapshot of whatever is
/// installed at the time of the call.
pub struct SchemaStore {
    source: Arc<dyn DocumentSource>,
    current: RwLock<Option<Arc<Generation>>>,
}

impl SchemaStore {
    /// Create a store that reads local files and `http(s)` URLs
    pub fn new() -> LoadResult<Self> {
        Ok(Self::with_source(Arc::new(DefaultSource::new()?)))
    }

    pub fn with_source(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
        }
    }

    /// Load a document and make it the current generation
    pub async fn load(&self, path: &str) -> LoadResult<Metadata> {
        info!("Loading API description from: {}", path);
        let content = match self.source.read(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", path, e);
                return Err(e);
            }
        };
        self.load_str(&content, path)
    }

    /// Same as [`load`](Self::load) for text already in memory
    pub fn load_str(&self, content: &str, origin: &str) -> LoadResult<Metadata> {
        let generation = match Generation::build(content, origin) {
            Ok(generation) => generation,
            Err(e) => {
                warn!("Failed to load {}: {} (keeping previous document)", origin, e);
                return Err(e);
            }
        };

        let metadata = generation.metadata.clone();
        info!(
            "Loaded {} v{}: {} operations, {} schemas",
            metadata.title,
            metadata.version,
            generation.operations.len(),
            generation.document.schemas.len()
        );
        *self.current.write() = Some(Arc::new(generation));
        Ok(metadata)
    }

    /// Drop the current generation
    pub fn clear(&self) {
        if self.current.write().take().is_some() {
            info!("Cleared loaded API description");
        }
    }

    /// The generation installed right now, if any
    pub fn snapshot(&self) -> Option<Arc<Generation>> {
        self.current.read().clone()
    }

    pub fn has_schema(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn metadata(&self) -> Option<Metadata> {
        self.snapshot().map(|g| g.metadata.clone())
    }

    pub fn find_operation(&self, query: &OperationQuery) -> Option<Operation> {
        self.snapshot()?.find_operation(query).cloned()
    }

    pub fn find_operations(&self, filter: Option<&str>) -> Vec<Operation> {
        self.snapshot()
            .map(|g| g.find_operations(filter).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_schema(&self, name: &str) -> Option<Schema> {
        self.snapshot()?.get_schema(name)
    }

    pub fn get_schema_names(&self) -> Vec<String> {
        self.snapshot()
            .map(|g| g.schema_names())
            .unwrap_or_default()
    }

    /// Prefix scan over the example index; see [`ExampleIndex::for_operation`]
    pub fn get_examples_for_operation(&self, operation_id: &str) -> Vec<(String, Example)> {
        self.snapshot()
            .map(|g| {
                g.examples
                    .for_operation(operation_id)
                    .into_iter()
                    .map(|(key, example)| (key.to_string(), example.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn servers(&self) -> Vec<ServerInfo> {
        self.snapshot()
            .map(|g| g.document.servers.clone())
            .unwrap_or_default()
    }

    pub fn global_security(&self) -> Vec<SecurityRequirement> {
        self.snapshot()
            .map(|g| g.document.security.clone())
            .unwrap_or_default()
    }

    pub fn security_schemes(&self) -> IndexMap<String, SecurityScheme> {
        self.snapshot()
            .map(|g| g.document.security_schemes.clone())
            .unwrap_or_default()
    }

    pub fn operation_count(&self) -> usize {
        self.snapshot().map(|g| g.operations.len()).unwrap_or(0)
    }

    pub fn tags(&self) -> IndexMap<String, usize> {
        self.snapshot().map(|g| g.tags()).unwrap_or_default()
    }

    pub fn request_schema(&self, operation_id: &str, content_type: Option<&str>) -> RequestSchemaLookup {
        match self.snapshot() {
            Some(g) => g.request_schema(operation_id, content_type),
            None => RequestSchemaLookup::OperationNotFound,
        }
    }

    pub fn response_schema(
        &self,
        operation_id: &str,
        status: Option<&str>,
        content_type: Option<&str>,
    ) -> ResponseSchemaLookup {
        match self.snapshot() {
            Some(g) => g.response_schema(operation_id, status, content_type),
            None => ResponseSchemaLookup::OperationNotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEALTH_ECHO: &str = r##"
openapi: "3.0.3"
info:
  title: Echo API
  version: "2.1.0"
  description: Echoes things back
servers:
  - url: https://echo.example.com
paths:
  /health:
    get:
      operationId: getHealth
      summary: Health check
      tags: [ops]
      responses:
        "200":
          description: Healthy
          content:
            application/json:
              schema:
                type: object
                properties:
                  status: {type: string}
  /echo:
    post:
      operationId: postEcho
      summary: Echo a message
      tags: [messages, ops]
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: "#/components/schemas/Message"
      responses:
        "200":
          description: The same message
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Message"
        "204":
          description: Nothing to echo
components:
  schemas:
    Message:
      type: object
      required: [text]
      properties:
        text: {type: string}
    Envelope:
      type: object
      properties:
        message: {$ref: "#/components/schemas/Message"}
"##;

    fn spec_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn loaded() -> SchemaStore {
        let store = SchemaStore::new().unwrap();
        store.load_str(HEALTH_ECHO, "memory").unwrap();
        store
    }

    #[tokio::test]
    async fn test_load_health_and_echo() {
        let file = spec_file(HEALTH_ECHO);
        let path = file.path().to_str().unwrap();
        let store = SchemaStore::new().unwrap();
        assert!(!store.has_schema());

        let metadata = store.load(path).await.unwrap();
        assert_eq!(metadata.title, "Echo API");
        assert_eq!(metadata.version, "2.1.0");
        assert_eq!(metadata.path, path);
        assert!(store.has_schema());

        let operations = store.find_operations(None);
        assert_eq!(operations.len(), 2);

        let health = &operations[0];
        assert_eq!(health.method, HttpMethod::Get);
        assert!(health.request_body.is_none());

        let echo = &operations[1];
        let content: Vec<&String> = echo.request_body.as_ref().unwrap().content.keys().collect();
        assert_eq!(content, vec!["application/json"]);
    }

    #[tokio::test]
    async fn test_reload_is_idempotent() {
        let file = spec_file(HEALTH_ECHO);
        let path = file.path().to_str().unwrap();
        let store = SchemaStore::new().unwrap();

        let first = store.load(path).await.unwrap();
        let first_ops = store.find_operations(None);
        let second = store.load(path).await.unwrap();
        let second_ops = store.find_operations(None);

        assert_eq!(first.title, second.title);
        assert_eq!(first.version, second.version);
        assert_eq!(first_ops, second_ops);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_generation() {
        let store = loaded();

        let result = store.load("/no/such/file.yaml").await;
        assert!(matches!(result, Err(LoadError::Unreadable { .. })));

        let broken = HEALTH_ECHO.replace("#/components/schemas/Message", "#/components/schemas/Nope");
        assert!(store.load_str(&broken, "broken").is_err());

        assert_eq!(store.metadata().unwrap().title, "Echo API");
        assert_eq!(store.operation_count(), 2);
    }

    #[test]
    fn test_failed_first_load_leaves_store_empty() {
        let store = SchemaStore::new().unwrap();
        let result = store.load_str("openapi: '3.0.0'\npaths: {}\n", "no-info");
        assert!(matches!(result, Err(LoadError::MissingField(_))));
        assert!(!store.has_schema());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = loaded();
        store.clear();
        store.clear();
        assert!(!store.has_schema());
        assert!(store.find_operations(None).is_empty());
        assert!(store.get_schema("Message").is_none());
    }

    #[test]
    fn test_snapshot_survives_clear() {
        let store = loaded();
        let snapshot = store.snapshot().unwrap();
        store.clear();
        assert_eq!(snapshot.operations.len(), 2);
    }

    #[test]
    fn test_find_operation_precedence() {
        let store = loaded();

        let by_id = store.find_operation(&OperationQuery::by_id("postEcho")).unwrap();
        assert_eq!(by_id.path, "/echo");

        let by_route = store
            .find_operation(&OperationQuery::by_route(HttpMethod::Get, "/health"))
            .unwrap();
        assert_eq!(by_route.operation_id, "getHealth");

        let both = OperationQuery {
            operation_id: Some("postEcho".into()),
            method: Some(HttpMethod::Get),
            path: Some("/health".into()),
        };
        assert_eq!(store.find_operation(&both).unwrap().operation_id, "postEcho");

        assert!(store
            .find_operation(&OperationQuery::by_route(HttpMethod::Get, "/HEALTH"))
            .is_none());
        assert!(store.find_operation(&OperationQuery::default()).is_none());
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let store = loaded();
        for filter in ["get", "GET", "Get"] {
            let ops = store.find_operations(Some(filter));
            assert_eq!(ops.len(), 1, "filter {}", filter);
            assert_eq!(ops[0].operation_id, "getHealth");
        }
        assert_eq!(store.find_operations(Some("messages")).len(), 1);
        assert_eq!(store.find_operations(Some("OPS")).len(), 2);
        assert_eq!(store.find_operations(Some("")).len(), 2);
    }

    #[test]
    fn test_filter_is_a_plain_substring() {
        let store = loaded();
        assert!(store.find_operations(Some("get ")).is_empty());
        assert_eq!(store.find_operations(Some("/ech")).len(), 1);
        assert_eq!(store.find_operations(Some("health check")).len(), 1);
    }

    #[test]
    fn test_schema_names_keep_source_order() {
        let store = loaded();
        assert_eq!(store.get_schema_names(), vec!["Message", "Envelope"]);
        let message = store.get_schema("Message").unwrap();
        assert_eq!(message.to_value()["required"], serde_json::json!(["text"]));
    }

    #[test]
    fn test_request_schema_without_body() {
        let store = loaded();
        assert!(matches!(
            store.request_schema("getHealth", None),
            RequestSchemaLookup::NoRequestBody
        ));
        assert!(matches!(
            store.request_schema("missing", None),
            RequestSchemaLookup::OperationNotFound
        ));
        match store.request_schema("postEcho", Some("text/plain")) {
            RequestSchemaLookup::ContentTypeNotFound { available, .. } => {
                assert_eq!(available, vec!["application/json"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        match store.request_schema("postEcho", None) {
            RequestSchemaLookup::Found {
                content_type,
                required,
                schema,
            } => {
                assert_eq!(content_type, "application/json");
                assert!(required);
                assert_eq!(schema.unwrap().node().name.as_deref(), Some("Message"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_response_schema_selection() {
        let store = loaded();
        match store.response_schema("postEcho", None, None) {
            ResponseSchemaLookup::Found { status, .. } => assert_eq!(status, "200"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            store.response_schema("postEcho", Some("204"), None),
            ResponseSchemaLookup::NoContent { .. }
        ));
        match store.response_schema("postEcho", Some("404"), None) {
            ResponseSchemaLookup::StatusNotFound { available, .. } => {
                assert_eq!(available, vec!["200", "204"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tags_in_first_seen_order() {
        let store = loaded();
        let tags: Vec<(String, usize)> = store.tags().into_iter().collect();
        assert_eq!(
            tags,
            vec![("ops".to_string(), 2), ("messages".to_string(), 1)]
        );
    }
}
