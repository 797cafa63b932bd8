//! Schema arena
//!
//! Every schema subtree of a document is stored once in a flat table and
//! addressed by [`SchemaId`]. A `$ref` that is used in several places (or that
//! refers back to one of its ancestors) resolves to the same id, so the arena
//! is a graph rather than a tree. Renderers walk it with a path check and emit
//! a circular marker instead of recursing forever. A composite node reached a
//! second time (not through a cycle) is rendered once and then referred to by
//! a reference marker, which keeps output linear in the size of the arena.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Key used to mark a schema that refers back to one of its ancestors
pub const CIRCULAR_REF_KEY: &str = "x-circular-ref";

/// Key used in place of a schema already rendered elsewhere in the same output
pub const REF_KEY: &str = "x-ref";

/// Stable index of a schema node inside a [`SchemaArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// `additionalProperties` is either a flag or a nested schema
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(SchemaId),
}

/// Constraints of a string node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringNode {
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

/// Constraints of a `number` or `integer` node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberNode {
    pub integer: bool,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    /// Boolean in 3.0, number in 3.1; carried as-is
    pub exclusive_minimum: Option<Value>,
    pub exclusive_maximum: Option<Value>,
    pub multiple_of: Option<Number>,
}

/// Shape of an object node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode {
    pub properties: IndexMap<String, SchemaId>,
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,
}

/// Shape of an array node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayNode {
    pub items: Option<SchemaId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: Option<bool>,
}

/// What kind of value a schema node describes.
///
/// Chosen from the declared `type` when present, otherwise inferred from the
/// keywords the node carries.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String(StringNode),
    Number(NumberNode),
    Boolean,
    Object(ObjectNode),
    Array(ArrayNode),
    /// No `type`, only `allOf`/`oneOf`/`anyOf`
    Composition,
    Unknown,
}

/// One schema node.
///
/// Keywords that are not modelled explicitly are kept verbatim in `extra`, so
/// rendering a node back to JSON loses nothing but the keywords that a
/// transformation removed on purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    /// The `type` keyword as written, when it is a single string
    pub type_name: Option<String>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub enum_values: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub nullable: Option<bool>,
    pub read_only: Option<bool>,
    pub all_of: Vec<SchemaId>,
    pub one_of: Vec<SchemaId>,
    pub any_of: Vec<SchemaId>,
    pub example: Option<Value>,
    pub examples: Option<Vec<Value>>,
    pub extra: IndexMap<String, Value>,
    /// Component name when the node was reached through `#/components/schemas/*`
    pub name: Option<String>,
}

impl SchemaNode {
    /// An empty node of the given kind
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            type_name: None,
            format: None,
            title: None,
            description: None,
            enum_values: None,
            default: None,
            nullable: None,
            read_only: None,
            all_of: Vec::new(),
            one_of: Vec::new(),
            any_of: Vec::new(),
            example: None,
            examples: None,
            extra: IndexMap::new(),
            name: None,
        }
    }

    /// Node ids this node points at, in rendering order
    pub fn children(&self) -> Vec<SchemaId> {
        let mut children = Vec::new();
        match &self.kind {
            SchemaKind::Object(object) => {
                children.extend(object.properties.values().copied());
                if let Some(AdditionalProperties::Schema(id)) = object.additional_properties {
                    children.push(id);
                }
            }
            SchemaKind::Array(array) => children.extend(array.items),
            _ => {}
        }
        children.extend(self.all_of.iter().copied());
        children.extend(self.one_of.iter().copied());
        children.extend(self.any_of.iter().copied());
        children
    }

    /// Whether the node points at any other node
    pub fn is_composite(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn has_composition(&self) -> bool {
        !self.all_of.is_empty() || !self.one_of.is_empty() || !self.any_of.is_empty()
    }
}

/// Flat table of schema nodes
#[derive(Debug, Clone, Default)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
}

impl SchemaArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id
    pub fn push(&mut self, node: SchemaNode) -> SchemaId {
        self.nodes.push(node);
        SchemaId(self.nodes.len() - 1)
    }

    /// Reserve an id before the node is built, so references to it from
    /// inside its own subtree can already point at it.
    pub fn reserve(&mut self) -> SchemaId {
        self.push(SchemaNode::new(SchemaKind::Unknown))
    }

    /// Fill a previously reserved slot
    pub fn fill(&mut self, id: SchemaId, node: SchemaNode) {
        self.nodes[id.0] = node;
    }

    pub fn get(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Component name of a node, or a positional stand-in
    pub fn display_name(&self, id: SchemaId) -> String {
        self.get(id)
            .name
            .clone()
            .unwrap_or_else(|| format!("schema#{}", id.0))
    }

    /// Marker emitted in place of a node that is already being rendered
    pub fn circular_marker(&self, id: SchemaId) -> Value {
        marker(CIRCULAR_REF_KEY, self.display_name(id))
    }

    /// Marker emitted in place of a node rendered earlier in the same output
    pub fn ref_marker(&self, id: SchemaId) -> Value {
        marker(REF_KEY, self.display_name(id))
    }

    /// Render a node and everything below it as plain JSON
    pub fn to_value(&self, id: SchemaId) -> Value {
        let mut walk = Walk::default();
        self.render(id, &mut walk)
    }

    fn render(&self, id: SchemaId, walk: &mut Walk) -> Value {
        if walk.path.contains(&id) {
            return self.circular_marker(id);
        }
        let node = self.get(id);
        if !walk.expanded.insert(id) && node.is_composite() {
            return self.ref_marker(id);
        }
        walk.path.push(id);
        let mut out = Map::new();

        if let Some(type_name) = &node.type_name {
            out.insert("type".into(), Value::String(type_name.clone()));
        }
        insert_str(&mut out, "format", &node.format);
        insert_str(&mut out, "title", &node.title);
        insert_str(&mut out, "description", &node.description);
        if let Some(values) = &node.enum_values {
            out.insert("enum".into(), Value::Array(values.clone()));
        }
        insert_value(&mut out, "default", &node.default);
        if let Some(nullable) = node.nullable {
            out.insert("nullable".into(), Value::Bool(nullable));
        }
        if let Some(read_only) = node.read_only {
            out.insert("readOnly".into(), Value::Bool(read_only));
        }

        match &node.kind {
            SchemaKind::String(string) => {
                insert_str(&mut out, "pattern", &string.pattern);
                insert_u64(&mut out, "minLength", string.min_length);
                insert_u64(&mut out, "maxLength", string.max_length);
            }
            SchemaKind::Number(number) => {
                insert_number(&mut out, "minimum", &number.minimum);
                insert_number(&mut out, "maximum", &number.maximum);
                insert_value(&mut out, "exclusiveMinimum", &number.exclusive_minimum);
                insert_value(&mut out, "exclusiveMaximum", &number.exclusive_maximum);
                insert_number(&mut out, "multipleOf", &number.multiple_of);
            }
            SchemaKind::Object(object) => {
                if !object.properties.is_empty() {
                    let properties: Map<String, Value> = object
                        .properties
                        .iter()
                        .map(|(name, child)| (name.clone(), self.render(*child, walk)))
                        .collect();
                    out.insert("properties".into(), Value::Object(properties));
                }
                if !object.required.is_empty() {
                    out.insert(
                        "required".into(),
                        Value::Array(object.required.iter().cloned().map(Value::String).collect()),
                    );
                }
                match &object.additional_properties {
                    Some(AdditionalProperties::Allowed(flag)) => {
                        out.insert("additionalProperties".into(), Value::Bool(*flag));
                    }
                    Some(AdditionalProperties::Schema(child)) => {
                        out.insert("additionalProperties".into(), self.render(*child, walk));
                    }
                    None => {}
                }
            }
            SchemaKind::Array(array) => {
                if let Some(items) = array.items {
                    out.insert("items".into(), self.render(items, walk));
                }
                insert_u64(&mut out, "minItems", array.min_items);
                insert_u64(&mut out, "maxItems", array.max_items);
                if let Some(unique) = array.unique_items {
                    out.insert("uniqueItems".into(), Value::Bool(unique));
                }
            }
            SchemaKind::Boolean | SchemaKind::Composition | SchemaKind::Unknown => {}
        }

        for (keyword, branches) in [
            ("allOf", &node.all_of),
            ("oneOf", &node.one_of),
            ("anyOf", &node.any_of),
        ] {
            if !branches.is_empty() {
                let rendered = branches.iter().map(|b| self.render(*b, walk)).collect();
                out.insert(keyword.into(), Value::Array(rendered));
            }
        }

        insert_value(&mut out, "example", &node.example);
        if let Some(examples) = &node.examples {
            out.insert("examples".into(), Value::Array(examples.clone()));
        }
        for (key, value) in &node.extra {
            out.insert(key.clone(), value.clone());
        }

        walk.path.pop();
        Value::Object(out)
    }
}

/// Bookkeeping for one rendering pass
#[derive(Default)]
struct Walk {
    /// Nodes on the current descent path
    path: Vec<SchemaId>,
    /// Every node entered so far
    expanded: HashSet<SchemaId>,
}

/// `{key: target}`
pub fn marker(key: &str, target: String) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), Value::String(target));
    Value::Object(map)
}

fn insert_str(out: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        out.insert(key.into(), Value::String(v.clone()));
    }
}

fn insert_value(out: &mut Map<String, Value>, key: &str, value: &Option<Value>) {
    if let Some(v) = value {
        out.insert(key.into(), v.clone());
    }
}

fn insert_u64(out: &mut Map<String, Value>, key: &str, value: Option<u64>) {
    if let Some(v) = value {
        out.insert(key.into(), Value::from(v));
    }
}

fn insert_number(out: &mut Map<String, Value>, key: &str, value: &Option<Number>) {
    if let Some(v) = value {
        out.insert(key.into(), Value::Number(v.clone()));
    }
}

/// A schema handed out to callers: a shared arena plus the root node id.
///
/// Cloning is cheap; the arena is reference counted and never mutated once
/// it is wrapped here.
#[derive(Debug, Clone)]
pub struct Schema {
    arena: Arc<SchemaArena>,
    root: SchemaId,
}

impl Schema {
    pub fn new(arena: Arc<SchemaArena>, root: SchemaId) -> Self {
        Self { arena, root }
    }

    pub fn arena(&self) -> &SchemaArena {
        &self.arena
    }

    pub fn root(&self) -> SchemaId {
        self.root
    }

    pub fn node(&self) -> &SchemaNode {
        self.arena.get(self.root)
    }

    /// Same arena, different root
    pub fn at(&self, id: SchemaId) -> Schema {
        Schema {
            arena: Arc::clone(&self.arena),
            root: id,
        }
    }

    /// Render as plain JSON
    pub fn to_value(&self) -> Value {
        self.arena.to_value(self.root)
    }

    /// Pretty-printed JSON text
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn string_node() -> SchemaNode {
        let mut node = SchemaNode::new(SchemaKind::String(StringNode::default()));
        node.type_name = Some("string".into());
        node
    }

    #[test]
    fn test_render_object_keeps_property_order() {
        let mut arena = SchemaArena::new();
        let name = arena.push(string_node());
        let id = arena.push(string_node());

        let mut object = ObjectNode::default();
        object.properties.insert("name".into(), name);
        object.properties.insert("id".into(), id);
        object.required.push("id".into());
        let mut node = SchemaNode::new(SchemaKind::Object(object));
        node.type_name = Some("object".into());
        let root = arena.push(node);

        let value = arena.to_value(root);
        let keys: Vec<&String> = value["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "id"]);
        assert_eq!(value["required"], json!(["id"]));
    }

    #[test]
    fn test_render_breaks_cycles() {
        let mut arena = SchemaArena::new();
        let root = arena.reserve();

        let mut object = ObjectNode::default();
        object.properties.insert("parent".into(), root);
        let mut node = SchemaNode::new(SchemaKind::Object(object));
        node.type_name = Some("object".into());
        node.name = Some("TreeNode".into());
        arena.fill(root, node);

        let value = arena.to_value(root);
        assert_eq!(value["properties"]["parent"][CIRCULAR_REF_KEY], "TreeNode");
    }

    #[test]
    fn test_shared_node_is_expanded_at_every_site() {
        let mut arena = SchemaArena::new();
        let shared = arena.push(string_node());
        let mut node = SchemaNode::new(SchemaKind::Composition);
        node.one_of = vec![shared, shared];
        let root = arena.push(node);

        let value = arena.to_value(root);
        assert_eq!(value["oneOf"], json!([{"type": "string"}, {"type": "string"}]));
    }

    /// `S0 -> S1 -> ... -> S29`, each level pointing twice at the next
    fn doubling_chain(arena: &mut SchemaArena, depth: usize) -> SchemaId {
        let mut next = arena.push(string_node());
        for level in (0..depth).rev() {
            let mut object = ObjectNode::default();
            object.properties.insert("left".into(), next);
            object.properties.insert("right".into(), next);
            let mut node = SchemaNode::new(SchemaKind::Object(object));
            node.type_name = Some("object".into());
            node.name = Some(format!("S{}", level));
            next = arena.push(node);
        }
        next
    }

    #[test]
    fn test_shared_composite_is_rendered_once() {
        let mut arena = SchemaArena::new();
        let root = doubling_chain(&mut arena, 30);

        let value = arena.to_value(root);
        assert_eq!(value["properties"]["right"], marker(REF_KEY, "S1".into()));
        assert_eq!(value["properties"]["left"]["properties"]["right"], marker(REF_KEY, "S2".into()));
        assert!(serde_json::to_string(&value).unwrap().len() < 5_000);
    }
}
