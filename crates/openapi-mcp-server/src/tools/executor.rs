//! Execute query tools against the schema store

use openapi_index::{
    paginate, Generation, HttpMethod, OperationQuery, PaginateOptions, RequestSchemaLookup,
    ResponseSchemaLookup, SchemaStore, SimplifyOptions,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ToolError, ToolResult};
use super::registry::*;
use super::render;
use crate::protocol::ToolCallResult;

/// Schema names listed in a "not found" message before eliding the rest
const MAX_SUGGESTIONS: usize = 20;

#[derive(Debug, Deserialize)]
struct LoadSpecArgs {
    path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageArgs {
    start_index: Option<usize>,
    chunk_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListOperationsArgs {
    filter: Option<String>,
    #[serde(flatten)]
    page: PageArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetOperationArgs {
    operation_id: Option<String>,
    method: Option<String>,
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestSchemaArgs {
    operation_id: String,
    content_type: Option<String>,
    #[serde(default)]
    compact: bool,
    #[serde(flatten)]
    page: PageArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseSchemaArgs {
    operation_id: String,
    status_code: Option<String>,
    content_type: Option<String>,
    #[serde(default)]
    compact: bool,
    #[serde(flatten)]
    page: PageArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetSchemaArgs {
    name: String,
    #[serde(default)]
    compact: bool,
    include_descriptions: Option<bool>,
    include_examples: Option<bool>,
    max_enum_values: Option<usize>,
    #[serde(flatten)]
    page: PageArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationExamplesArgs {
    operation_id: String,
}

/// Executor for the query tools
pub struct ToolExecutor {
    store: Arc<SchemaStore>,
    /// Chunk size when a call does not pass `chunkSize`
    chunk_size: usize,
}

impl ToolExecutor {
    pub fn new(store: Arc<SchemaStore>, chunk_size: usize) -> Self {
        Self { store, chunk_size }
    }

    /// Execute a tool by name
    pub async fn execute(
        &self,
        tool_name: &str,
        arguments: Option<Value>,
    ) -> ToolResult<ToolCallResult> {
        debug!("Executing tool: {}", tool_name);
        let args = match arguments {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(args) => args,
        };

        let text = match tool_name {
            LOAD_SPEC => self.load_spec(parse(tool_name, args)?).await?,
            GET_API_INFO => render::api_info(&*self.generation()?),
            LIST_OPERATIONS => self.list_operations(parse(tool_name, args)?)?,
            GET_OPERATION => self.get_operation(parse(tool_name, args)?)?,
            GET_REQUEST_SCHEMA => self.get_request_schema(parse(tool_name, args)?)?,
            GET_RESPONSE_SCHEMA => self.get_response_schema(parse(tool_name, args)?)?,
            LIST_SCHEMAS => render::schema_names(&self.generation()?.schema_names()),
            GET_SCHEMA => self.get_schema(parse(tool_name, args)?)?,
            GET_OPERATION_EXAMPLES => self.get_operation_examples(parse(tool_name, args)?)?,
            LIST_TAGS => render::tags(&self.generation()?.tags()),
            _ => return Err(ToolError::UnknownTool(tool_name.to_string())),
        };

        Ok(ToolCallResult::text(text))
    }

    fn generation(&self) -> ToolResult<Arc<Generation>> {
        self.store.snapshot().ok_or(ToolError::NotLoaded)
    }

    async fn load_spec(&self, args: LoadSpecArgs) -> ToolResult<String> {
        let metadata = self.store.load(&args.path).await?;
        info!("Loaded {} via load_spec", args.path);
        Ok(format!(
            "Loaded {} v{} from {}\nOperations: {}\nSchemas: {}",
            metadata.title,
            metadata.version,
            metadata.path,
            self.store.operation_count(),
            self.store.get_schema_names().len()
        ))
    }

    fn list_operations(&self, args: ListOperationsArgs) -> ToolResult<String> {
        let generation = self.generation()?;
        let filter = args.filter.as_deref();
        let operations = generation.find_operations(filter);
        Ok(self.page(render::operation_list(&operations, filter), &args.page))
    }

    fn get_operation(&self, args: GetOperationArgs) -> ToolResult<String> {
        let generation = self.generation()?;

        let method = match args.method.as_deref() {
            Some(method) => Some(HttpMethod::from_key(&method.to_lowercase()).ok_or_else(|| {
                ToolError::invalid_arguments(GET_OPERATION, format!("unknown method {}", method))
            })?),
            None => None,
        };
        if args.operation_id.is_none() && (method.is_none() || args.path.is_none()) {
            return Err(ToolError::invalid_arguments(
                GET_OPERATION,
                "pass operationId, or both method and path",
            ));
        }

        let query = OperationQuery {
            operation_id: args.operation_id.clone(),
            method,
            path: args.path.clone(),
        };
        let operation = generation.find_operation(&query).ok_or_else(|| {
            let wanted = match (&args.operation_id, method, &args.path) {
                (Some(id), _, _) => id.clone(),
                (None, Some(method), Some(path)) => format!("{} {}", method, path),
                _ => String::new(),
            };
            ToolError::OperationNotFound(wanted)
        })?;

        Ok(render::operation(&generation, operation))
    }

    fn get_request_schema(&self, args: RequestSchemaArgs) -> ToolResult<String> {
        let generation = self.generation()?;
        let id = &args.operation_id;

        let text = match generation.request_schema(id, args.content_type.as_deref()) {
            RequestSchemaLookup::OperationNotFound => {
                return Err(ToolError::OperationNotFound(id.clone()))
            }
            RequestSchemaLookup::NoRequestBody => {
                format!("Operation {} has no request body", id)
            }
            RequestSchemaLookup::ContentTypeNotFound {
                requested,
                available,
            } => {
                return Err(ToolError::ContentTypeNotFound {
                    requested,
                    available: available.join(", "),
                })
            }
            RequestSchemaLookup::Found {
                content_type,
                required,
                schema,
            } => {
                let header = format!(
                    "Request body for {} ({}{})",
                    id,
                    content_type,
                    if required { ", required" } else { "" }
                );
                let body = match schema {
                    Some(schema) => {
                        render::schema_text(&schema, args.compact, &SimplifyOptions::default())
                    }
                    None => "No schema declared".to_string(),
                };
                format!("{}\n\n{}", header, body)
            }
        };

        Ok(self.page(text, &args.page))
    }

    fn get_response_schema(&self, args: ResponseSchemaArgs) -> ToolResult<String> {
        let generation = self.generation()?;
        let id = &args.operation_id;

        let lookup = generation.response_schema(
            id,
            args.status_code.as_deref(),
            args.content_type.as_deref(),
        );
        let text = match lookup {
            ResponseSchemaLookup::OperationNotFound => {
                return Err(ToolError::OperationNotFound(id.clone()))
            }
            ResponseSchemaLookup::StatusNotFound {
                requested: None,
                available,
            } if available.is_empty() => format!("Operation {} declares no responses", id),
            ResponseSchemaLookup::StatusNotFound {
                requested,
                available,
            } => {
                return Err(ToolError::ResponseNotFound {
                    requested: requested.unwrap_or_default(),
                    available: available.join(", "),
                })
            }
            ResponseSchemaLookup::NoContent {
                status,
                description,
            } => format!(
                "Response {} for {}: {}\n\nNo content",
                status,
                id,
                description.unwrap_or_default()
            ),
            ResponseSchemaLookup::ContentTypeNotFound {
                requested,
                available,
                ..
            } => {
                return Err(ToolError::ContentTypeNotFound {
                    requested,
                    available: available.join(", "),
                })
            }
            ResponseSchemaLookup::Found {
                status,
                description,
                content_type,
                schema,
            } => {
                let mut header = format!("Response {} for {} ({})", status, id, content_type);
                if let Some(description) = description.filter(|d| !d.is_empty()) {
                    header.push_str(&format!(": {}", description));
                }
                let body = match schema {
                    Some(schema) => {
                        render::schema_text(&schema, args.compact, &SimplifyOptions::default())
                    }
                    None => "No schema declared".to_string(),
                };
                format!("{}\n\n{}", header, body)
            }
        };

        Ok(self.page(text, &args.page))
    }

    fn get_schema(&self, args: GetSchemaArgs) -> ToolResult<String> {
        let generation = self.generation()?;
        let schema = generation.get_schema(&args.name).ok_or_else(|| {
            let names = generation.schema_names();
            let mut available = names
                .iter()
                .take(MAX_SUGGESTIONS)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            if names.len() > MAX_SUGGESTIONS {
                available.push_str(&format!(" (and {} more)", names.len() - MAX_SUGGESTIONS));
            }
            ToolError::SchemaNotFound {
                name: args.name.clone(),
                available,
            }
        })?;

        let defaults = SimplifyOptions::default();
        let options = SimplifyOptions {
            include_descriptions: args
                .include_descriptions
                .unwrap_or(defaults.include_descriptions),
            include_examples: args.include_examples.unwrap_or(defaults.include_examples),
            max_enum_values: args.max_enum_values.unwrap_or(defaults.max_enum_values),
            ..defaults
        };

        let text = render::schema_text(&schema, args.compact, &options);
        Ok(self.page(text, &args.page))
    }

    fn get_operation_examples(&self, args: OperationExamplesArgs) -> ToolResult<String> {
        let generation = self.generation()?;
        let id = &args.operation_id;

        let examples: Vec<_> = generation
            .examples
            .for_operation(id)
            .into_iter()
            .map(|(key, example)| (key.to_string(), example.clone()))
            .collect();
        if !examples.is_empty() {
            return Ok(render::examples(id, &examples));
        }
        match generation.find_operation(&OperationQuery::by_id(id.as_str())) {
            Some(_) => Ok(format!("No examples found for operation {}", id)),
            None => Err(ToolError::OperationNotFound(id.clone())),
        }
    }

    /// Chunk long output; short output is returned unchanged
    fn page(&self, text: String, args: &PageArgs) -> String {
        let options = PaginateOptions {
            start_index: args.start_index.unwrap_or(0),
            chunk_size: args.chunk_size.unwrap_or(self.chunk_size),
            ..Default::default()
        };
        let page = paginate(&text, &options);
        if !page.has_more && !page.has_previous {
            return page.content;
        }
        format!("{}\n\n{}", page.content, page.footer)
    }
}

fn parse<T: DeserializeOwned>(tool: &str, args: Value) -> ToolResult<T> {
    serde_json::from_value(args).map_err(|e| ToolError::invalid_arguments(tool, e.to_string()))
}
