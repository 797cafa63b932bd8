//! `$ref` resolution
//!
//! Turns a raw JSON tree into a [`Document`] in which nothing points anywhere
//! any more: schemas are interned into a [`SchemaArena`] (one id per
//! referenced target, so shared and recursive schemas become shared ids) and
//! every other reusable object (parameters, request bodies, responses,
//! examples, security schemes, path items) is copied inline. Keywords the
//! arena does not model keep their raw JSON, with any `$ref` inside them
//! checked and replaced as well.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::schema::{
    marker, AdditionalProperties, ArrayNode, NumberNode, ObjectNode, SchemaArena, SchemaId,
    SchemaKind, SchemaNode, StringNode, CIRCULAR_REF_KEY, REF_KEY,
};
use crate::types::*;

/// Longest chain of `$ref` → `$ref` hops followed for non-schema objects
const MAX_REF_HOPS: usize = 32;

const SCHEMA_PREFIX: &str = "#/components/schemas/";

/// Keys of a path item that hold operations
const OPERATION_KEYS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Resolve a parsed document
pub fn resolve_document(root: &Value) -> LoadResult<Document> {
    RefResolver::new(root).resolve()
}

struct RefResolver<'a> {
    root: &'a Value,
    arena: SchemaArena,
    /// Reference string → interned id
    interned: HashMap<String, SchemaId>,
    /// References currently being followed as pure aliases
    aliasing: HashSet<String>,
}

impl<'a> RefResolver<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            arena: SchemaArena::new(),
            interned: HashMap::new(),
            aliasing: HashSet::new(),
        }
    }

    fn resolve(mut self) -> LoadResult<Document> {
        let root = self.root;
        if !root.is_object() {
            return Err(LoadError::InvalidFormat(
                "document root must be a mapping".to_string(),
            ));
        }

        let openapi = Self::version_marker(root)?;
        let info = Self::info(root)?;
        debug!("Resolving OpenAPI {} document: {}", openapi, info.title);

        let mut schemas = IndexMap::new();
        if let Some(components) = root.pointer("/components/schemas") {
            let components = components.as_object().ok_or_else(|| {
                LoadError::InvalidFormat("components.schemas must be a mapping".to_string())
            })?;
            for name in components.keys() {
                let reference = format!("{}{}", SCHEMA_PREFIX, escape_pointer(name));
                let id = self.intern_ref(&reference)?;
                schemas.insert(name.clone(), id);
            }
        }

        let mut paths = IndexMap::new();
        if let Some(raw_paths) = root.get("paths") {
            let raw_paths = raw_paths
                .as_object()
                .ok_or_else(|| LoadError::InvalidFormat("paths must be a mapping".to_string()))?;
            for (path, item) in raw_paths {
                let item = self.path_item(path, item)?;
                paths.insert(path.clone(), item);
            }
        }

        let servers = match root.get("servers") {
            Some(value) => self.typed(value, "servers")?,
            None => Vec::new(),
        };
        let security = match root.get("security") {
            Some(value) => self.typed(value, "security")?,
            None => Vec::new(),
        };
        let security_schemes = self.security_schemes()?;

        debug!(
            "Resolved {} paths, {} named schemas, {} schema nodes",
            paths.len(),
            schemas.len(),
            self.arena.len()
        );

        Ok(Document {
            openapi,
            info,
            servers,
            paths,
            schemas,
            security,
            security_schemes,
            arena: Arc::new(self.arena),
        })
    }

    fn version_marker(root: &Value) -> LoadResult<String> {
        if let Some(swagger) = root.get("swagger") {
            return Err(LoadError::UnsupportedVersion(format!(
                "swagger {}",
                scalar_to_string(swagger).unwrap_or_default()
            )));
        }
        let openapi = root
            .get("openapi")
            .and_then(scalar_to_string)
            .ok_or_else(|| LoadError::MissingField("openapi".to_string()))?;
        if !openapi.starts_with("3.") {
            return Err(LoadError::UnsupportedVersion(openapi));
        }
        Ok(openapi)
    }

    fn info(root: &Value) -> LoadResult<ApiInfo> {
        let info = root
            .get("info")
            .filter(|v| v.is_object())
            .ok_or_else(|| LoadError::MissingField("info".to_string()))?;
        let title = info
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| LoadError::MissingField("info.title".to_string()))?;
        // YAML reads `version: 1.0` as a number
        let version = info
            .get("version")
            .and_then(scalar_to_string)
            .ok_or_else(|| LoadError::MissingField("info.version".to_string()))?;
        Ok(ApiInfo {
            title: title.to_string(),
            version,
            description: info
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    // --- generic dereferencing ---

    /// Look up a local JSON pointer reference
    fn lookup(&self, reference: &str) -> LoadResult<&'a Value> {
        let pointer = reference.strip_prefix('#').ok_or_else(|| {
            LoadError::unresolved(reference, "only local references are supported")
        })?;
        self.root
            .pointer(pointer)
            .ok_or_else(|| LoadError::unresolved(reference, "target does not exist"))
    }

    /// Follow `$ref` hops until a concrete object is reached
    fn deref(&self, value: &Value) -> LoadResult<Value> {
        let mut current = value;
        let mut hops = 0;
        while let Some(reference) = ref_of(current) {
            hops += 1;
            if hops > MAX_REF_HOPS {
                return Err(LoadError::unresolved(reference, "reference chain too long"));
            }
            current = self.lookup(reference)?;
        }
        Ok(current.clone())
    }

    /// Dereference and deserialize into a raw structure
    fn typed<T: DeserializeOwned>(&self, value: &Value, context: &str) -> LoadResult<T> {
        let value = self.deref(value)?;
        serde_json::from_value(value)
            .map_err(|e| LoadError::InvalidFormat(format!("{}: {}", context, e)))
    }

    // --- schemas ---

    /// Intern a schema that may itself be a `$ref`
    fn intern(&mut self, value: &Value) -> LoadResult<SchemaId> {
        if let Some(reference) = ref_of(value) {
            return self.intern_ref(reference);
        }
        let id = self.arena.reserve();
        let node = self.build_node(value)?;
        self.arena.fill(id, node);
        Ok(id)
    }

    /// Intern the target of a reference once; later uses share the id
    fn intern_ref(&mut self, reference: &str) -> LoadResult<SchemaId> {
        if let Some(id) = self.interned.get(reference) {
            return Ok(*id);
        }

        let target = self.lookup(reference)?;
        if let Some(next) = ref_of(target) {
            if !self.aliasing.insert(reference.to_string()) {
                return Err(LoadError::unresolved(
                    reference,
                    "reference only points at itself",
                ));
            }
            let id = self.intern_ref(next)?;
            self.aliasing.remove(reference);
            self.interned.insert(reference.to_string(), id);
            return Ok(id);
        }

        // Record the id before building so recursive uses resolve to it
        let id = self.arena.reserve();
        self.interned.insert(reference.to_string(), id);
        let mut node = self.build_node(target)?;
        node.name = component_name(reference);
        self.arena.fill(id, node);
        Ok(id)
    }

    fn intern_all(&mut self, value: &Value) -> Option<LoadResult<Vec<SchemaId>>> {
        let items = value.as_array()?;
        Some(items.iter().map(|item| self.intern(item)).collect())
    }

    fn build_node(&mut self, value: &Value) -> LoadResult<SchemaNode> {
        let Some(obj) = value.as_object() else {
            // Boolean schemas and other oddities degrade to an unknown node
            return Ok(SchemaNode::new(SchemaKind::Unknown));
        };

        let type_name = obj.get("type").and_then(Value::as_str).map(str::to_string);
        let effective_type = type_name.clone().or_else(|| {
            obj.get("type")
                .and_then(Value::as_array)
                .and_then(|types| types.iter().filter_map(Value::as_str).find(|t| *t != "null"))
                .map(str::to_string)
        });

        let kind = match effective_type.as_deref() {
            Some("string") => SchemaKind::String(StringNode::default()),
            Some("integer") => SchemaKind::Number(NumberNode {
                integer: true,
                ..Default::default()
            }),
            Some("number") => SchemaKind::Number(NumberNode::default()),
            Some("boolean") => SchemaKind::Boolean,
            Some("object") => SchemaKind::Object(ObjectNode::default()),
            Some("array") => SchemaKind::Array(ArrayNode::default()),
            Some(_) => SchemaKind::Unknown,
            None if obj.contains_key("properties") || obj.contains_key("additionalProperties") => {
                SchemaKind::Object(ObjectNode::default())
            }
            None if obj.contains_key("items") => SchemaKind::Array(ArrayNode::default()),
            None if ["allOf", "oneOf", "anyOf"].iter().any(|k| obj.contains_key(*k)) => {
                SchemaKind::Composition
            }
            None => SchemaKind::Unknown,
        };

        let mut node = SchemaNode::new(kind);
        node.type_name = type_name;

        for (key, raw) in obj {
            if !self.apply_keyword(&mut node, key, raw)? {
                let raw = self.unmodelled(key, raw)?;
                node.extra.insert(key.clone(), raw);
            }
        }
        Ok(node)
    }

    /// Raw value of a keyword kept in `extra`. Vendor extensions and `const`
    /// are data and stay as written; everywhere else a `$ref` must resolve.
    fn unmodelled(&self, key: &str, raw: &Value) -> LoadResult<Value> {
        if key.starts_with("x-") || key == "const" {
            return Ok(raw.clone());
        }
        if key == "discriminator" {
            let mapping = raw.get("mapping").and_then(Value::as_object);
            for target in mapping.into_iter().flat_map(|m| m.values()).filter_map(Value::as_str) {
                if target.starts_with('#') {
                    self.lookup(target)?;
                }
            }
            return Ok(raw.clone());
        }
        self.inline_refs(raw, &mut Vec::new())
    }

    /// Copy a raw subtree, replacing a `$ref` to a component schema with a
    /// reference marker and inlining any other local target
    fn inline_refs(&self, value: &Value, following: &mut Vec<String>) -> LoadResult<Value> {
        match value {
            Value::Object(map) => {
                if let Some(reference) = ref_of(value) {
                    let target = self.lookup(reference)?;
                    if let Some(name) = component_name(reference) {
                        return Ok(marker(REF_KEY, name));
                    }
                    if following.iter().any(|r| r == reference) {
                        return Ok(marker(CIRCULAR_REF_KEY, reference.to_string()));
                    }
                    following.push(reference.to_string());
                    let inlined = self.inline_refs(target, following);
                    following.pop();
                    return inlined;
                }
                let mut out = Map::new();
                for (key, child) in map {
                    out.insert(key.clone(), self.inline_refs(child, following)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.inline_refs(item, following))
                .collect::<LoadResult<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    /// Store one keyword on the node. Returns false when the keyword is not
    /// modelled for this kind of node (or has an unexpected shape), in which
    /// case the caller keeps it verbatim.
    fn apply_keyword(&mut self, node: &mut SchemaNode, key: &str, raw: &Value) -> LoadResult<bool> {
        let applied = match key {
            "type" => node.type_name.is_some(),
            "format" => set(&mut node.format, raw.as_str().map(str::to_string)),
            "title" => set(&mut node.title, raw.as_str().map(str::to_string)),
            "description" => set(&mut node.description, raw.as_str().map(str::to_string)),
            "enum" => set(&mut node.enum_values, raw.as_array().cloned()),
            "default" => set(&mut node.default, Some(raw.clone())),
            "nullable" => set(&mut node.nullable, raw.as_bool()),
            "readOnly" => set(&mut node.read_only, raw.as_bool()),
            "example" => set(&mut node.example, Some(raw.clone())),
            "examples" => set(&mut node.examples, raw.as_array().cloned()),
            "allOf" | "oneOf" | "anyOf" => match self.intern_all(raw) {
                Some(ids) => {
                    let ids = ids?;
                    match key {
                        "allOf" => node.all_of = ids,
                        "oneOf" => node.one_of = ids,
                        _ => node.any_of = ids,
                    }
                    true
                }
                None => false,
            },
            _ => self.apply_kind_keyword(&mut node.kind, key, raw)?,
        };
        Ok(applied)
    }

    fn apply_kind_keyword(&mut self, kind: &mut SchemaKind, key: &str, raw: &Value) -> LoadResult<bool> {
        let applied = match (kind, key) {
            (SchemaKind::String(s), "pattern") => set(&mut s.pattern, raw.as_str().map(str::to_string)),
            (SchemaKind::String(s), "minLength") => set(&mut s.min_length, raw.as_u64()),
            (SchemaKind::String(s), "maxLength") => set(&mut s.max_length, raw.as_u64()),
            (SchemaKind::Number(n), "minimum") => set(&mut n.minimum, as_number(raw)),
            (SchemaKind::Number(n), "maximum") => set(&mut n.maximum, as_number(raw)),
            (SchemaKind::Number(n), "exclusiveMinimum") => set(&mut n.exclusive_minimum, Some(raw.clone())),
            (SchemaKind::Number(n), "exclusiveMaximum") => set(&mut n.exclusive_maximum, Some(raw.clone())),
            (SchemaKind::Number(n), "multipleOf") => set(&mut n.multiple_of, as_number(raw)),
            (SchemaKind::Object(o), "properties") => match raw.as_object() {
                Some(props) => {
                    for (name, child) in props {
                        let id = self.intern(child)?;
                        o.properties.insert(name.clone(), id);
                    }
                    true
                }
                None => false,
            },
            (SchemaKind::Object(o), "required") => match raw.as_array() {
                Some(items) => {
                    o.required = items.iter().filter_map(Value::as_str).map(str::to_string).collect();
                    true
                }
                None => false,
            },
            (SchemaKind::Object(o), "additionalProperties") => match raw {
                Value::Bool(flag) => set(&mut o.additional_properties, Some(AdditionalProperties::Allowed(*flag))),
                Value::Object(_) => {
                    let id = self.intern(raw)?;
                    set(&mut o.additional_properties, Some(AdditionalProperties::Schema(id)))
                }
                _ => false,
            },
            (SchemaKind::Array(a), "items") if raw.is_object() => {
                let id = self.intern(raw)?;
                set(&mut a.items, Some(id))
            }
            (SchemaKind::Array(a), "minItems") => set(&mut a.min_items, raw.as_u64()),
            (SchemaKind::Array(a), "maxItems") => set(&mut a.max_items, raw.as_u64()),
            (SchemaKind::Array(a), "uniqueItems") => set(&mut a.unique_items, raw.as_bool()),
            _ => false,
        };
        Ok(applied)
    }

    // --- paths and operations ---

    fn path_item(&mut self, path: &str, raw: &Value) -> LoadResult<PathItem> {
        let item = self.deref(raw)?;
        let item = item
            .as_object()
            .ok_or_else(|| LoadError::InvalidFormat(format!("path item {} must be a mapping", path)))?;

        let parameters = match item.get("parameters") {
            Some(raw) => self.parameters(raw, path)?,
            None => Vec::new(),
        };

        let mut operations = IndexMap::new();
        for (key, raw_op) in item {
            if !OPERATION_KEYS.contains(&key.as_str()) {
                continue;
            }
            let context = format!("{} {}", key, path);
            let operation = self.operation(raw_op, &context)?;
            operations.insert(key.clone(), operation);
        }

        Ok(PathItem {
            parameters,
            operations,
        })
    }

    fn operation(&mut self, raw: &Value, context: &str) -> LoadResult<OperationDef> {
        let raw: RawOperation = self.typed(raw, context)?;

        let parameters = self.parameter_list(&raw.parameters, context)?;
        let request_body = match &raw.request_body {
            Some(body) => Some(self.request_body(body, context)?),
            None => None,
        };
        let mut responses = IndexMap::new();
        for (status, response) in &raw.responses {
            let context = format!("{} response {}", context, status);
            responses.insert(status.clone(), self.response(response, &context)?);
        }

        Ok(OperationDef {
            operation_id: raw.operation_id,
            summary: raw.summary,
            description: raw.description,
            tags: raw.tags,
            deprecated: raw.deprecated,
            parameters,
            request_body,
            responses,
            security: raw.security,
            servers: raw.servers,
        })
    }

    fn parameters(&mut self, raw: &Value, context: &str) -> LoadResult<Vec<Parameter>> {
        let list: Vec<Value> = self.typed(raw, context)?;
        self.parameter_list(&list, context)
    }

    fn parameter_list(&mut self, raw: &[Value], context: &str) -> LoadResult<Vec<Parameter>> {
        let mut parameters = Vec::with_capacity(raw.len());
        for param in raw {
            let context = format!("{} parameter", context);
            let param: RawParameter = self.typed(param, &context)?;
            let location = ParameterLocation::from_key(&param.location).ok_or_else(|| {
                LoadError::InvalidFormat(format!(
                    "{} '{}' has unknown location '{}'",
                    context, param.name, param.location
                ))
            })?;

            let schema = match (&param.schema, param.content.values().next()) {
                (Some(schema), _) => Some(self.intern(schema)?),
                (None, Some(media)) => self.media_type(media, &context)?.schema,
                (None, None) => None,
            };

            parameters.push(Parameter {
                name: param.name,
                location,
                required: param.required || location == ParameterLocation::Path,
                description: param.description,
                deprecated: param.deprecated,
                schema,
                example: param.example,
            });
        }
        Ok(parameters)
    }

    fn request_body(&mut self, raw: &Value, context: &str) -> LoadResult<RequestBody> {
        let context = format!("{} request body", context);
        let raw: RawRequestBody = self.typed(raw, &context)?;
        Ok(RequestBody {
            description: raw.description,
            required: raw.required,
            content: self.content(&raw.content, &context)?,
        })
    }

    fn response(&mut self, raw: &Value, context: &str) -> LoadResult<Response> {
        let raw: RawResponse = self.typed(raw, context)?;
        Ok(Response {
            description: raw.description,
            content: self.content(&raw.content, context)?,
        })
    }

    fn content(
        &mut self,
        raw: &IndexMap<String, Value>,
        context: &str,
    ) -> LoadResult<IndexMap<String, MediaType>> {
        let mut content = IndexMap::new();
        for (content_type, media) in raw {
            let context = format!("{} {}", context, content_type);
            content.insert(content_type.clone(), self.media_type(media, &context)?);
        }
        Ok(content)
    }

    fn media_type(&mut self, raw: &Value, context: &str) -> LoadResult<MediaType> {
        let raw: RawMediaType = self.typed(raw, context)?;
        let schema = match &raw.schema {
            Some(schema) => Some(self.intern(schema)?),
            None => None,
        };

        let mut examples = IndexMap::new();
        for (name, example) in &raw.examples {
            let example: RawExample = self.typed(example, &format!("{} example {}", context, name))?;
            let value = example
                .value
                .or_else(|| example.external_value.map(Value::String))
                .unwrap_or(Value::Null);
            examples.insert(
                name.clone(),
                Example {
                    name: name.clone(),
                    summary: example.summary,
                    value,
                },
            );
        }

        Ok(MediaType {
            schema,
            example: raw.example,
            examples,
        })
    }

    // --- security ---

    fn security_schemes(&self) -> LoadResult<IndexMap<String, SecurityScheme>> {
        let mut schemes = IndexMap::new();
        let Some(raw) = self.root.pointer("/components/securitySchemes").and_then(Value::as_object)
        else {
            return Ok(schemes);
        };
        for (name, scheme) in raw {
            let scheme: RawSecurityScheme =
                self.typed(scheme, &format!("security scheme {}", name))?;
            if let Some(converted) = convert_security_scheme(scheme) {
                schemes.insert(name.clone(), converted);
            }
        }
        Ok(schemes)
    }
}

fn convert_security_scheme(raw: RawSecurityScheme) -> Option<SecurityScheme> {
    match raw.scheme_type.as_str() {
        "apiKey" => Some(SecurityScheme::ApiKey {
            name: raw.name.unwrap_or_default(),
            location: raw
                .location
                .as_deref()
                .and_then(ParameterLocation::from_key)
                .unwrap_or(ParameterLocation::Header),
        }),
        "http" => Some(SecurityScheme::Http {
            scheme: raw.scheme.unwrap_or_else(|| "bearer".to_string()),
            bearer_format: raw.bearer_format,
        }),
        "oauth2" => {
            let mut scopes = IndexMap::new();
            for flow in raw.flows.unwrap_or_default().into_values() {
                for (scope, description) in flow.scopes {
                    scopes.entry(scope).or_insert(description);
                }
            }
            Some(SecurityScheme::OAuth2 { scopes })
        }
        "openIdConnect" => Some(SecurityScheme::OpenIdConnect {
            openid_connect_url: raw.openid_connect_url.unwrap_or_default(),
        }),
        _ => None,
    }
}

/// Assign only when a value of the expected shape was found
fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

fn ref_of(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn component_name(reference: &str) -> Option<String> {
    let rest = reference.strip_prefix(SCHEMA_PREFIX)?;
    if rest.contains('/') {
        return None;
    }
    Some(rest.replace("~1", "/").replace("~0", "~"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(extra: Value) -> Value {
        let mut base = json!({
            "openapi": "3.0.3",
            "info": {"title": "Test API", "version": "1.0.0"},
            "paths": {}
        });
        for (k, v) in extra.as_object().unwrap() {
            base[k] = v.clone();
        }
        base
    }

    #[test]
    fn test_resolve_simple_ref() {
        let root = doc(json!({
            "components": {"schemas": {
                "User": {
                    "type": "object",
                    "properties": {"name": {"type": "string"}, "email": {"type": "string"}},
                    "required": ["name", "email"]
                },
                "Account": {
                    "type": "object",
                    "properties": {"owner": {"$ref": "#/components/schemas/User"}}
                }
            }}
        }));
        let document = resolve_document(&root).unwrap();

        let user = document.schemas["User"];
        let account = document.arena.get(document.schemas["Account"]);
        match &account.kind {
            SchemaKind::Object(object) => assert_eq!(object.properties["owner"], user),
            other => panic!("expected object, got {:?}", other),
        }
        assert_eq!(document.arena.get(user).name.as_deref(), Some("User"));
        assert_eq!(document.arena.to_value(user)["required"], json!(["name", "email"]));
    }

    #[test]
    fn test_recursive_schema_shares_id() {
        let root = doc(json!({
            "components": {"schemas": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                    }
                }
            }}
        }));
        let document = resolve_document(&root).unwrap();
        let node_id = document.schemas["Node"];
        let rendered = document.arena.to_value(node_id);
        assert_eq!(
            rendered["properties"]["children"]["items"][crate::schema::CIRCULAR_REF_KEY],
            "Node"
        );
    }

    #[test]
    fn test_unresolvable_reference_fails() {
        let root = doc(json!({
            "components": {"schemas": {
                "Broken": {"$ref": "#/components/schemas/Missing"}
            }}
        }));
        let err = resolve_document(&root).unwrap_err();
        assert!(matches!(err, LoadError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_external_reference_fails() {
        let root = doc(json!({
            "paths": {"/pets": {"get": {
                "responses": {"200": {"$ref": "other.yaml#/components/responses/Ok"}}
            }}}
        }));
        let err = resolve_document(&root).unwrap_err();
        assert!(matches!(err, LoadError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_refs_in_unmodelled_keywords_are_resolved() {
        let root = doc(json!({
            "components": {"schemas": {
                "Id": {"type": "object", "properties": {"value": {"type": "integer"}}},
                "A": {
                    "type": "object",
                    "not": {"$ref": "#/components/schemas/Id"},
                    "x-note": {"$ref": "anything"}
                },
                "T": {
                    "type": "array",
                    "prefixItems": [
                        {"$ref": "#/components/schemas/Id/properties/value"},
                        {"type": "string"}
                    ]
                },
                "P": {
                    "oneOf": [{"$ref": "#/components/schemas/Id"}],
                    "discriminator": {
                        "propertyName": "kind",
                        "mapping": {"id": "#/components/schemas/Id", "other": "Other"}
                    }
                }
            }}
        }));
        let document = resolve_document(&root).unwrap();

        let a = document.arena.to_value(document.schemas["A"]);
        assert_eq!(a["not"], json!({"x-ref": "Id"}));
        assert_eq!(a["x-note"], json!({"$ref": "anything"}));

        let t = document.arena.to_value(document.schemas["T"]);
        assert_eq!(t["prefixItems"], json!([{"type": "integer"}, {"type": "string"}]));

        let p = document.arena.to_value(document.schemas["P"]);
        assert_eq!(p["discriminator"]["mapping"]["id"], "#/components/schemas/Id");
    }

    #[test]
    fn test_broken_ref_in_unmodelled_keyword_fails() {
        for schema in [
            json!({"type": "object", "not": {"$ref": "#/components/schemas/Missing"}}),
            json!({"type": "string", "properties": {"a": {"$ref": "#/nowhere"}}}),
            json!({"oneOf": [], "discriminator": {
                "propertyName": "kind",
                "mapping": {"x": "#/components/schemas/Missing"}
            }}),
        ] {
            let root = doc(json!({"components": {"schemas": {"A": schema}}}));
            let err = resolve_document(&root).unwrap_err();
            assert!(matches!(err, LoadError::UnresolvedReference { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_self_alias_fails() {
        let root = doc(json!({
            "components": {"schemas": {
                "A": {"$ref": "#/components/schemas/B"},
                "B": {"$ref": "#/components/schemas/A"}
            }}
        }));
        assert!(resolve_document(&root).is_err());
    }

    #[test]
    fn test_missing_info_fields() {
        let root = json!({"openapi": "3.0.0", "info": {"version": "1"}, "paths": {}});
        assert!(matches!(
            resolve_document(&root),
            Err(LoadError::MissingField(field)) if field == "info.title"
        ));

        let root = json!({"openapi": "3.0.0", "paths": {}});
        assert!(matches!(resolve_document(&root), Err(LoadError::MissingField(_))));
    }

    #[test]
    fn test_swagger_is_unsupported() {
        let root = json!({"swagger": "2.0", "info": {"title": "t", "version": "1"}, "paths": {}});
        assert!(matches!(
            resolve_document(&root),
            Err(LoadError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_parameter_and_body_refs_are_inlined() {
        let root = doc(json!({
            "paths": {"/users/{id}": {
                "parameters": [{"$ref": "#/components/parameters/UserId"}],
                "put": {
                    "requestBody": {"$ref": "#/components/requestBodies/UserBody"},
                    "responses": {"204": {"description": "Updated"}}
                }
            }},
            "components": {
                "parameters": {
                    "UserId": {"name": "id", "in": "path", "schema": {"type": "string", "format": "uuid"}}
                },
                "requestBodies": {
                    "UserBody": {
                        "required": true,
                        "content": {"application/json": {
                            "schema": {"type": "object"},
                            "examples": {"basic": {"$ref": "#/components/examples/Basic"}}
                        }}
                    }
                },
                "examples": {"Basic": {"summary": "Basic user", "value": {"name": "Ada"}}}
            }
        }));
        let document = resolve_document(&root).unwrap();
        let item = &document.paths["/users/{id}"];
        assert_eq!(item.parameters.len(), 1);
        assert_eq!(item.parameters[0].name, "id");
        assert!(item.parameters[0].required);

        let body = item.operations["put"].request_body.as_ref().unwrap();
        assert!(body.required);
        let example = &body.content["application/json"].examples["basic"];
        assert_eq!(example.summary.as_deref(), Some("Basic user"));
        assert_eq!(example.value, json!({"name": "Ada"}));
    }

    #[test]
    fn test_unmodelled_keywords_are_kept() {
        let root = doc(json!({
            "components": {"schemas": {
                "Tagged": {"type": "string", "x-internal": true, "deprecated": true}
            }}
        }));
        let document = resolve_document(&root).unwrap();
        let value = document.arena.to_value(document.schemas["Tagged"]);
        assert_eq!(value["x-internal"], true);
        assert_eq!(value["deprecated"], true);
    }

    #[test]
    fn test_numeric_version_is_accepted() {
        let root = json!({"openapi": "3.1.0", "info": {"title": "t", "version": 2}, "paths": {}});
        let document = resolve_document(&root).unwrap();
        assert_eq!(document.info.version, "2");
    }
}
