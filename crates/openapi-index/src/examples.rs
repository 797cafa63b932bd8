//! Flat index of named examples

use indexmap::IndexMap;

use crate::types::{Example, MediaType, Operation};

/// Every named example of every operation, keyed
/// `{operationId}-{request|response}-[statusCode-]{contentType}-{exampleName}`
#[derive(Debug, Clone, Default)]
pub struct ExampleIndex {
    entries: IndexMap<String, Example>,
}

impl ExampleIndex {
    /// Walk request and response content blocks of all operations
    pub fn build(operations: &[Operation]) -> Self {
        let mut index = Self::default();

        for op in operations {
            if let Some(body) = &op.request_body {
                for (content_type, media) in &body.content {
                    let prefix = format!("{}-request-{}", op.operation_id, content_type);
                    index.insert_all(&prefix, media);
                }
            }
            for (status, response) in &op.responses {
                for (content_type, media) in &response.content {
                    let prefix =
                        format!("{}-response-{}-{}", op.operation_id, status, content_type);
                    index.insert_all(&prefix, media);
                }
            }
        }

        index
    }

    fn insert_all(&mut self, prefix: &str, media: &MediaType) {
        for (name, example) in &media.examples {
            // Duplicate operation ids produce duplicate keys; the first one wins
            self.entries
                .entry(format!("{}-{}", prefix, name))
                .or_insert_with(|| example.clone());
        }
    }

    /// Examples whose key starts with `{operation_id}-`, in index order.
    ///
    /// This is a plain prefix scan: an id that is itself a prefix of another
    /// id followed by `-` (say `get` and `get-all`) also returns the other
    /// operation's examples.
    pub fn for_operation(&self, operation_id: &str) -> Vec<(&str, &Example)> {
        let prefix = format!("{}-", operation_id);
        self.entries
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, example)| (key.as_str(), example))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Example> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::OperationExtractor;
    use crate::parser::DocumentParser;
    use crate::resolver::resolve_document;
    use serde_json::json;

    const SPEC: &str = r#"
openapi: "3.0.0"
info: {title: Examples, version: "1"}
paths:
  /pets:
    post:
      operationId: createPet
      requestBody:
        content:
          application/json:
            schema: {type: object}
            examples:
              cat: {summary: A cat, value: {name: Tom}}
              dog: {value: {name: Rex}}
      responses:
        "201":
          description: Created
          content:
            application/json:
              examples:
                created: {value: {id: 1}}
  /pets/all:
    get:
      operationId: createPet-all
      responses:
        "200":
          description: OK
          content:
            application/json:
              examples:
                list: {value: []}
"#;

    fn index() -> ExampleIndex {
        let root = DocumentParser::parse_yaml(SPEC).unwrap();
        let document = resolve_document(&root).unwrap();
        ExampleIndex::build(&OperationExtractor::extract(&document))
    }

    #[test]
    fn test_composite_keys() {
        let index = index();
        assert_eq!(index.len(), 4);

        let cat = index.get("createPet-request-application/json-cat").unwrap();
        assert_eq!(cat.summary.as_deref(), Some("A cat"));
        assert_eq!(cat.value, json!({"name": "Tom"}));

        let created = index.get("createPet-response-201-application/json-created").unwrap();
        assert_eq!(created.value, json!({"id": 1}));
    }

    #[test]
    fn test_prefix_scan_over_matches() {
        let index = index();
        let keys: Vec<&str> = index
            .for_operation("createPet")
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(
            keys,
            vec![
                "createPet-request-application/json-cat",
                "createPet-request-application/json-dog",
                "createPet-response-201-application/json-created",
                "createPet-all-response-200-application/json-list",
            ]
        );
        assert_eq!(index.for_operation("createPet-all").len(), 1);
        assert!(index.for_operation("missing").is_empty());
    }
}
