//! One-line type summaries
//!
//! `format_compact` turns a schema into a short TypeScript-ish string such as
//! `{ id: string (uuid), tags?: string[] }`. Used for operation listings and
//! the `compact` output mode of the schema tools.

use serde_json::Value;
use std::collections::HashSet;

use crate::schema::{Schema, SchemaArena, SchemaId, SchemaKind, SchemaNode, CIRCULAR_REF_KEY};

/// Enums at or below this size are listed in full
const FULL_ENUM_LIMIT: usize = 5;
/// Enums above this size only report their count
const LARGE_ENUM_LIMIT: usize = 100;
/// Members shown for medium-sized enums
const ENUM_PREVIEW: usize = 3;
/// Properties shown for an object before eliding the rest
const MAX_PROPERTIES: usize = 3;

/// Formats that only make sense on strings
const STRING_FORMATS: &[&str] = &[
    "date",
    "date-time",
    "time",
    "duration",
    "email",
    "uuid",
    "uri",
    "uri-reference",
    "hostname",
    "ipv4",
    "ipv6",
    "byte",
    "binary",
    "password",
];

/// Render a schema as a single-line type string. Never returns an empty
/// string; anything unrecognized is `unknown`.
pub fn format_compact(schema: &Schema) -> String {
    let mut formatter = CompactFormatter {
        arena: schema.arena(),
        path: Vec::new(),
        seen: HashSet::new(),
    };
    formatter.format(schema.root())
}

struct CompactFormatter<'a> {
    arena: &'a SchemaArena,
    path: Vec<SchemaId>,
    seen: HashSet<SchemaId>,
}

impl<'a> CompactFormatter<'a> {
    fn format(&mut self, id: SchemaId) -> String {
        let node = self.arena.get(id);
        if self.path.contains(&id) {
            return format!("{} (circular)", node.name.as_deref().unwrap_or("schema"));
        }
        // Marker left behind by the simplifier
        if let Some(target) = node.extra.get(CIRCULAR_REF_KEY).and_then(Value::as_str) {
            return format!("{} (circular)", target);
        }
        // Already spelled out once in this line
        if !self.seen.insert(id) && node.is_composite() {
            return node.name.clone().unwrap_or_else(|| "...".to_string());
        }
        self.path.push(id);
        let rendered = self.describe(node);
        self.path.pop();
        rendered
    }

    fn describe(&mut self, node: &SchemaNode) -> String {
        match &node.kind {
            SchemaKind::String(_) => {
                let mut out = String::from("string");
                if let Some(format) = &node.format {
                    out.push_str(&format!(" ({})", format));
                }
                out.push_str(&enum_suffix(node));
                out
            }
            SchemaKind::Number(number) => {
                let mut out = String::from(if number.integer { "integer" } else { "number" });
                if number.minimum.is_some() || number.maximum.is_some() {
                    let bound = |b: &Option<serde_json::Number>| {
                        b.as_ref().map_or_else(|| "*".to_string(), |n| n.to_string())
                    };
                    out.push_str(&format!(" ({}-{})", bound(&number.minimum), bound(&number.maximum)));
                }
                out.push_str(&enum_suffix(node));
                out
            }
            SchemaKind::Boolean => "boolean".to_string(),
            SchemaKind::Array(array) => match array.items {
                Some(items) => format!("{}[]", self.format(items)),
                None => "unknown[]".to_string(),
            },
            SchemaKind::Object(object) => {
                if object.properties.is_empty() {
                    return "object".to_string();
                }
                let mut fields: Vec<String> = object
                    .properties
                    .iter()
                    .take(MAX_PROPERTIES)
                    .map(|(name, child)| {
                        let marker = if object.required.contains(name) { "" } else { "?" };
                        format!("{}{}: {}", name, marker, self.format(*child))
                    })
                    .collect();
                if object.properties.len() > MAX_PROPERTIES {
                    fields.push("...".to_string());
                }
                format!("{{ {} }}", fields.join(", "))
            }
            SchemaKind::Composition => self.composition(node),
            SchemaKind::Unknown => {
                if node.has_composition() {
                    return self.composition(node);
                }
                if let Some(primitive) = enum_primitive(node) {
                    return format!("{}{}", primitive, enum_suffix(node));
                }
                match node.format.as_deref() {
                    Some(format) if STRING_FORMATS.contains(&format) => {
                        format!("string ({})", format)
                    }
                    _ => "unknown".to_string(),
                }
            }
        }
    }

    fn composition(&mut self, node: &SchemaNode) -> String {
        let (branches, separator) = if !node.one_of.is_empty() {
            (&node.one_of, " | ")
        } else if !node.any_of.is_empty() {
            (&node.any_of, " | ")
        } else if !node.all_of.is_empty() {
            (&node.all_of, " & ")
        } else {
            return "unknown".to_string();
        };
        branches
            .iter()
            .map(|branch| self.format(*branch))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// ` [a, b]`, ` [a, b, c, ...and 7 more]` or ` (250+ options available)`
fn enum_suffix(node: &SchemaNode) -> String {
    let Some(values) = &node.enum_values else {
        return String::new();
    };
    if values.is_empty() {
        return String::new();
    }

    if values.len() > LARGE_ENUM_LIMIT {
        return format!(" ({}+ options available)", values.len());
    }
    let mut shown: Vec<String> = if values.len() <= FULL_ENUM_LIMIT {
        values.iter().map(enum_member).collect()
    } else {
        values.iter().take(ENUM_PREVIEW).map(enum_member).collect()
    };
    if values.len() > FULL_ENUM_LIMIT {
        shown.push(format!("...and {} more", values.len() - ENUM_PREVIEW));
    }
    format!(" [{}]", shown.join(", "))
}

fn enum_member(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The primitive type shared by every enum member, if there is one.
/// Numbers count as one type: `integer` when every member is whole,
/// `number` otherwise.
fn enum_primitive(node: &SchemaNode) -> Option<&'static str> {
    let values = node.enum_values.as_ref()?;
    let mut kinds = values.iter().map(|value| match value {
        Value::String(_) => Some("string"),
        Value::Number(_) => Some("number"),
        Value::Bool(_) => Some("boolean"),
        _ => None,
    });
    let first = kinds.next()??;
    if !kinds.all(|kind| kind == Some(first)) {
        return None;
    }
    if first == "number" && values.iter().all(|v| v.is_i64() || v.is_u64()) {
        return Some("integer");
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_document;
    use serde_json::json;

    fn compact(schemas: Value, name: &str) -> String {
        let root = json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": {"schemas": schemas}
        });
        let document = resolve_document(&root).unwrap();
        format_compact(&Schema::new(document.arena.clone(), document.schemas[name]))
    }

    fn single(schema: Value) -> String {
        compact(json!({"S": schema}), "S")
    }

    fn letters(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("v{}", i)).collect()
    }

    #[test]
    fn test_primitives() {
        assert_eq!(single(json!({"type": "string", "format": "email"})), "string (email)");
        assert_eq!(single(json!({"type": "boolean"})), "boolean");
        assert_eq!(single(json!({"type": "integer", "minimum": 1, "maximum": 10})), "integer (1-10)");
        assert_eq!(single(json!({"type": "number", "minimum": 0})), "number (0-*)");
        assert_eq!(single(json!({"type": "number", "maximum": 5})), "number (*-5)");
        assert_eq!(single(json!({"type": "array", "items": {"type": "string"}})), "string[]");
    }

    #[test]
    fn test_enum_tiers() {
        assert_eq!(
            single(json!({"type": "string", "enum": letters(5)})),
            "string [v0, v1, v2, v3, v4]"
        );
        assert_eq!(
            single(json!({"type": "string", "enum": letters(6)})),
            "string [v0, v1, v2, ...and 3 more]"
        );
        assert_eq!(
            single(json!({"type": "string", "enum": letters(100)})),
            "string [v0, v1, v2, ...and 97 more]"
        );
        assert_eq!(
            single(json!({"type": "string", "enum": letters(101)})),
            "string (101+ options available)"
        );
    }

    #[test]
    fn test_object_shows_three_properties() {
        let rendered = single(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "string", "format": "uuid"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "age": {"type": "integer"},
                "extra": {"type": "boolean"}
            }
        }));
        assert_eq!(rendered, "{ id: string (uuid), tags?: string[], age?: integer, ... }");
        assert_eq!(single(json!({"type": "object"})), "object");
    }

    #[test]
    fn test_untyped_inference() {
        assert_eq!(single(json!({"properties": {"a": {"type": "string"}}})), "{ a?: string }");
        assert_eq!(single(json!({"items": {"type": "integer"}})), "integer[]");
        assert_eq!(single(json!({"enum": ["a", "b"]})), "string [a, b]");
        assert_eq!(single(json!({"enum": [1, "b"]})), "unknown");
        assert_eq!(single(json!({"enum": [1, 2]})), "integer [1, 2]");
        assert_eq!(single(json!({"enum": [1, 2.5]})), "number [1, 2.5]");
        assert_eq!(single(json!({"enum": [true, false]})), "boolean [true, false]");
        assert_eq!(single(json!({"format": "date-time"})), "string (date-time)");
        assert_eq!(single(json!({})), "unknown");
    }

    #[test]
    fn test_composition_and_cycles() {
        assert_eq!(
            single(json!({"oneOf": [{"type": "string"}, {"type": "integer"}]})),
            "string | integer"
        );
        assert_eq!(
            single(json!({"allOf": [{"properties": {"a": {"type": "string"}}}, {"properties": {"b": {"type": "string"}}}]})),
            "{ a?: string } & { b?: string }"
        );

        let rendered = compact(
            json!({"Node": {"type": "object", "properties": {
                "next": {"$ref": "#/components/schemas/Node"}
            }}}),
            "Node",
        );
        assert_eq!(rendered, "{ next?: Node (circular) }");
    }

    #[test]
    fn test_repeated_schema_is_named_after_first_use() {
        let rendered = compact(
            json!({
                "Point": {"type": "object", "properties": {"x": {"type": "number"}}},
                "Line": {"type": "object", "required": ["from", "to"], "properties": {
                    "from": {"$ref": "#/components/schemas/Point"},
                    "to": {"$ref": "#/components/schemas/Point"}
                }}
            }),
            "Line",
        );
        assert_eq!(rendered, "{ from: { x?: number }, to: Point }");
    }
}
