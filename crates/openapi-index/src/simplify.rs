//! Schema simplification
//!
//! Produces a reduced copy of a schema for display: `allOf` merged into one
//! object, long enums and example lists cut down, regex patterns and
//! descriptions optionally dropped. The input arena is never touched; the
//! result lives in a fresh arena. Each source node is simplified at most
//! once, so a schema used in several places stays shared in the output.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::schema::{
    AdditionalProperties, Schema, SchemaArena, SchemaId, SchemaKind, SchemaNode, StringNode,
    CIRCULAR_REF_KEY,
};

/// Key holding the note attached to a truncated enum
pub const ENUM_NOTE_KEY: &str = "x-enum-note";

/// Knobs for [`simplify`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimplifyOptions {
    /// Keep `pattern` on uuid and date-time strings
    pub include_patterns: bool,
    pub include_examples: bool,
    pub max_examples: usize,
    pub include_descriptions: bool,
    pub max_enum_values: usize,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            include_patterns: false,
            include_examples: true,
            max_examples: 3,
            include_descriptions: true,
            max_enum_values: 20,
        }
    }
}

/// Simplify a schema into a new, independent tree
pub fn simplify(schema: &Schema, options: &SimplifyOptions) -> Schema {
    let mut simplifier = Simplifier {
        source: schema.arena(),
        out: SchemaArena::new(),
        path: Vec::new(),
        done: HashMap::new(),
        options,
    };
    let root = simplifier.visit(schema.root());
    Schema::new(Arc::new(simplifier.out), root)
}

struct Simplifier<'a> {
    source: &'a SchemaArena,
    out: SchemaArena,
    /// Source ids on the current descent path
    path: Vec<SchemaId>,
    /// Source id → output id of every node already simplified
    done: HashMap<SchemaId, SchemaId>,
    options: &'a SimplifyOptions,
}

impl<'a> Simplifier<'a> {
    fn visit(&mut self, id: SchemaId) -> SchemaId {
        if self.path.contains(&id) {
            let target = self.source.display_name(id);
            let mut marker = SchemaNode::new(SchemaKind::Unknown);
            marker.extra.insert(CIRCULAR_REF_KEY.to_string(), Value::String(target.clone()));
            marker.name = Some(target);
            return self.out.push(marker);
        }
        if let Some(done) = self.done.get(&id) {
            return *done;
        }

        self.path.push(id);
        let mut merging = Vec::new();
        let node = self.flatten(id, &mut merging);
        let node = self.reduce(node);
        let node = self.relink(node);
        self.path.pop();
        let out = self.out.push(node);
        self.done.insert(id, out);
        out
    }

    /// The node with its `allOf` branches (recursively) merged in. The
    /// node's own keywords count as the first branch.
    fn flatten(&self, id: SchemaId, merging: &mut Vec<SchemaId>) -> SchemaNode {
        let source = self.source.get(id);
        let mut merged = source.clone();
        if source.all_of.is_empty() {
            return merged;
        }

        merged.all_of.clear();
        merging.push(id);
        for branch in &source.all_of {
            if merging.contains(branch) {
                continue;
            }
            let branch = self.flatten(*branch, merging);
            merge_branch(&mut merged, branch);
        }
        merging.pop();

        if matches!(merged.kind, SchemaKind::Composition | SchemaKind::Unknown)
            && merged.one_of.is_empty()
            && merged.any_of.is_empty()
        {
            merged.kind = SchemaKind::Object(Default::default());
        }
        if matches!(merged.kind, SchemaKind::Object(_)) && merged.type_name.is_none() {
            merged.type_name = Some("object".to_string());
        }
        merged
    }

    /// Apply the per-node reductions
    fn reduce(&self, mut node: SchemaNode) -> SchemaNode {
        let options = self.options;

        // Untyped nodes keep `pattern` among the unmodelled keywords
        let pattern = match &node.kind {
            SchemaKind::String(s) => s.pattern.as_deref(),
            _ => node.extra.get("pattern").and_then(Value::as_str),
        };
        let is_uuid = node.format.as_deref() == Some("uuid") || pattern.is_some_and(is_uuid_pattern);
        if is_uuid {
            if !matches!(node.kind, SchemaKind::String(_)) {
                let pattern = node
                    .extra
                    .shift_remove("pattern")
                    .and_then(|p| p.as_str().map(str::to_string));
                node.kind = SchemaKind::String(StringNode {
                    pattern,
                    ..Default::default()
                });
            }
            node.type_name = Some("string".to_string());
            node.format = Some("uuid".to_string());
        }
        if !options.include_patterns && (is_uuid || node.format.as_deref() == Some("date-time")) {
            if let SchemaKind::String(s) = &mut node.kind {
                s.pattern = None;
            }
            node.extra.shift_remove("pattern");
        }

        if let Some(values) = &mut node.enum_values {
            if values.len() > options.max_enum_values {
                let remaining = values.len() - options.max_enum_values;
                values.truncate(options.max_enum_values);
                let note = format!("...and {} more values", remaining);
                node.description = Some(match node.description.take() {
                    Some(description) if !description.is_empty() => {
                        format!("{} ({})", description, note)
                    }
                    _ => note.clone(),
                });
                node.extra.insert(ENUM_NOTE_KEY.to_string(), Value::String(note));
            }
        }

        if options.include_examples {
            if let Some(examples) = &mut node.examples {
                examples.truncate(options.max_examples);
            }
        } else {
            node.example = None;
            node.examples = None;
        }

        if !options.include_descriptions {
            node.description = None;
        }
        node.read_only = None;
        node
    }

    /// Simplify children and point the node at their new ids
    fn relink(&mut self, mut node: SchemaNode) -> SchemaNode {
        match &mut node.kind {
            SchemaKind::Object(object) => {
                for child in object.properties.values_mut() {
                    *child = self.visit(*child);
                }
                if let Some(AdditionalProperties::Schema(child)) = &mut object.additional_properties {
                    *child = self.visit(*child);
                }
            }
            SchemaKind::Array(array) => {
                if let Some(items) = &mut array.items {
                    *items = self.visit(*items);
                }
            }
            _ => {}
        }
        // oneOf/anyOf stay, but every branch is simplified with the same options
        node.one_of = node.one_of.iter().map(|b| self.visit(*b)).collect();
        node.any_of = node.any_of.iter().map(|b| self.visit(*b)).collect();
        node
    }
}

/// Fold one flattened `allOf` branch into the merged node
fn merge_branch(target: &mut SchemaNode, branch: SchemaNode) {
    match (&mut target.kind, branch.kind) {
        (SchemaKind::Object(into), SchemaKind::Object(from)) => {
            // Later branches win on key collisions
            for (name, id) in from.properties {
                into.properties.insert(name, id);
            }
            for name in from.required {
                if !into.required.contains(&name) {
                    into.required.push(name);
                }
            }
            if into.additional_properties.is_none() {
                into.additional_properties = from.additional_properties;
            }
        }
        (SchemaKind::String(into), SchemaKind::String(from)) => {
            fill(&mut into.pattern, from.pattern);
            fill(&mut into.min_length, from.min_length);
            fill(&mut into.max_length, from.max_length);
        }
        (SchemaKind::Number(into), SchemaKind::Number(from)) => {
            fill(&mut into.minimum, from.minimum);
            fill(&mut into.maximum, from.maximum);
            fill(&mut into.exclusive_minimum, from.exclusive_minimum);
            fill(&mut into.exclusive_maximum, from.exclusive_maximum);
            fill(&mut into.multiple_of, from.multiple_of);
        }
        (SchemaKind::Array(into), SchemaKind::Array(from)) => {
            fill(&mut into.items, from.items);
            fill(&mut into.min_items, from.min_items);
            fill(&mut into.max_items, from.max_items);
            fill(&mut into.unique_items, from.unique_items);
        }
        (kind @ (SchemaKind::Composition | SchemaKind::Unknown), from) => *kind = from,
        // Contradictory branches: keep what is already there
        _ => {}
    }

    if target.description.as_deref().map_or(true, str::is_empty) {
        if let Some(description) = branch.description.filter(|d| !d.is_empty()) {
            target.description = Some(description);
        }
    }
    fill(&mut target.type_name, branch.type_name);
    fill(&mut target.format, branch.format);
    fill(&mut target.title, branch.title);
    fill(&mut target.enum_values, branch.enum_values);
    fill(&mut target.default, branch.default);
    fill(&mut target.nullable, branch.nullable);
    fill(&mut target.read_only, branch.read_only);
    fill(&mut target.example, branch.example);
    fill(&mut target.examples, branch.examples);
    target.one_of.extend(branch.one_of);
    target.any_of.extend(branch.any_of);
    for (key, value) in branch.extra {
        target.extra.entry(key).or_insert(value);
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Whether a regex looks like the usual hand-written UUID pattern
fn is_uuid_pattern(pattern: &str) -> bool {
    static UUID: OnceLock<Regex> = OnceLock::new();
    UUID.get_or_init(|| {
        Regex::new(r"\[[0-9a-fA-F\-]+\]\{8\}-?\\?-?\[[0-9a-fA-F\-]+\]\{4\}").expect("static regex")
    })
    .is_match(pattern)
}
