//! Definitions of the query tools advertised through `tools/list`

use serde_json::{json, Map, Value};

use crate::protocol::{McpInputSchema, McpTool};

pub const LOAD_SPEC: &str = "load_spec";
pub const GET_API_INFO: &str = "get_api_info";
pub const LIST_OPERATIONS: &str = "list_operations";
pub const GET_OPERATION: &str = "get_operation";
pub const GET_REQUEST_SCHEMA: &str = "get_request_schema";
pub const GET_RESPONSE_SCHEMA: &str = "get_response_schema";
pub const LIST_SCHEMAS: &str = "list_schemas";
pub const GET_SCHEMA: &str = "get_schema";
pub const GET_OPERATION_EXAMPLES: &str = "get_operation_examples";
pub const LIST_TAGS: &str = "list_tags";

/// Names of every tool, in advertised order
pub const TOOL_NAMES: [&str; 10] = [
    LOAD_SPEC,
    GET_API_INFO,
    LIST_OPERATIONS,
    GET_OPERATION,
    GET_REQUEST_SCHEMA,
    GET_RESPONSE_SCHEMA,
    LIST_SCHEMAS,
    GET_SCHEMA,
    GET_OPERATION_EXAMPLES,
    LIST_TAGS,
];

/// Builds the tool list. Definitions do not depend on the loaded document.
pub struct ToolRegistry {
    tools: Vec<McpTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let tools = vec![
            ToolBuilder::new(
                LOAD_SPEC,
                "Load an OpenAPI 3.x description (JSON or YAML) from a file path or http(s) URL. \
                 Replaces the currently loaded description; a failed load keeps the previous one.",
            )
            .string("path", "File path or URL of the API description", true)
            .build(),
            ToolBuilder::new(
                GET_API_INFO,
                "Show title, version, description, servers and security of the loaded API",
            )
            .build(),
            ToolBuilder::new(
                LIST_OPERATIONS,
                "List operations as METHOD path with summary and operationId. The optional filter \
                 is matched case-insensitively against method, path, summary and tags.",
            )
            .string("filter", "Substring to filter operations by", false)
            .paging()
            .build(),
            ToolBuilder::new(
                GET_OPERATION,
                "Show one operation: parameters, request body, responses and security. \
                 Identify it by operationId, or by method and path.",
            )
            .string("operationId", "Operation ID", false)
            .string("method", "HTTP method, used with path", false)
            .string("path", "Path template, e.g. /users/{id}", false)
            .build(),
            ToolBuilder::new(
                GET_REQUEST_SCHEMA,
                "Get the simplified request body schema of an operation",
            )
            .string("operationId", "Operation ID", true)
            .string("contentType", "Content type; defaults to the first one declared", false)
            .boolean("compact", "Return a one-line type summary instead of JSON")
            .paging()
            .build(),
            ToolBuilder::new(
                GET_RESPONSE_SCHEMA,
                "Get the simplified response schema of an operation. Without a status code the \
                 first 2xx response is used, then default.",
            )
            .string("operationId", "Operation ID", true)
            .string("statusCode", "Status code, e.g. 200 or default", false)
            .string("contentType", "Content type; defaults to the first one declared", false)
            .boolean("compact", "Return a one-line type summary instead of JSON")
            .paging()
            .build(),
            ToolBuilder::new(LIST_SCHEMAS, "List the names of all component schemas").build(),
            ToolBuilder::new(GET_SCHEMA, "Get a named component schema, simplified")
                .string("name", "Schema name", true)
                .boolean("compact", "Return a one-line type summary instead of JSON")
                .boolean("includeDescriptions", "Keep description fields (default true)")
                .boolean("includeExamples", "Keep examples (default true)")
                .integer("maxEnumValues", "Enum values kept before truncating (default 20)")
                .paging()
                .build(),
            ToolBuilder::new(
                GET_OPERATION_EXAMPLES,
                "List the named request and response examples of an operation",
            )
            .string("operationId", "Operation ID", true)
            .build(),
            ToolBuilder::new(LIST_TAGS, "List tags with the number of operations using each")
                .build(),
        ];

        Self { tools }
    }

    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&McpTool> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct ToolBuilder {
    name: &'static str,
    description: &'static str,
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ToolBuilder {
    fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            properties: Map::new(),
            required: Vec::new(),
        }
    }

    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, json!({"type": "string", "description": description}), required)
    }

    fn boolean(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "boolean", "description": description}), false)
    }

    fn integer(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({"type": "integer", "minimum": 0, "description": description}),
            false,
        )
    }

    /// `startIndex` and `chunkSize` for paginated output
    fn paging(self) -> Self {
        self.integer("startIndex", "Character offset to start from (default 0)")
            .integer("chunkSize", "Maximum characters to return")
    }

    fn build(self) -> McpTool {
        McpTool {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            input_schema: McpInputSchema {
                schema_type: "object".to_string(),
                properties: Some(self.properties),
                required: if self.required.is_empty() {
                    None
                } else {
                    Some(self.required)
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_is_defined_once() {
        let registry = ToolRegistry::new();
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, TOOL_NAMES.to_vec());
    }

    #[test]
    fn test_input_schema_required_fields() {
        let registry = ToolRegistry::new();

        let tool = registry.get(GET_SCHEMA).unwrap();
        assert_eq!(tool.input_schema.required, Some(vec!["name".to_string()]));
        let props = tool.input_schema.properties.as_ref().unwrap();
        assert!(props.contains_key("maxEnumValues"));
        assert!(props.contains_key("startIndex"));

        let tool = registry.get(GET_API_INFO).unwrap();
        assert!(tool.input_schema.required.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let registry = ToolRegistry::new();
        let value = serde_json::to_value(registry.get(LOAD_SPEC).unwrap()).unwrap();
        assert_eq!(value["inputSchema"]["type"], "object");
        assert_eq!(value["inputSchema"]["properties"]["path"]["type"], "string");
    }
}
