//! Operation extraction from dereferenced documents

use crate::types::*;

/// Extracts operations from a [`Document`]
pub struct OperationExtractor;

impl OperationExtractor {
    /// Extract all operations: paths in source order, methods in the fixed
    /// order of [`HttpMethod::ALL`].
    ///
    /// Only the seven recognized method keys produce operations; `trace` and
    /// anything else on a path item is skipped without comment. Duplicate
    /// operation ids are kept as-is.
    pub fn extract(document: &Document) -> Vec<Operation> {
        let mut operations = Vec::new();

        for (path, item) in &document.paths {
            for method in HttpMethod::ALL {
                let Some(def) = item.operations.get(method.as_key()) else {
                    continue;
                };
                operations.push(Self::extract_operation(
                    path,
                    method,
                    def,
                    &item.parameters,
                    &document.security,
                ));
            }
        }

        operations
    }

    /// Extract a single operation
    fn extract_operation(
        path: &str,
        method: HttpMethod,
        def: &OperationDef,
        path_params: &[Parameter],
        global_security: &[SecurityRequirement],
    ) -> Operation {
        let operation_id = def
            .operation_id
            .clone()
            .unwrap_or_else(|| Self::generate_operation_id(path, method));

        // Path-item parameters first, then the operation's own
        let mut parameters = path_params.to_vec();
        parameters.extend(def.parameters.iter().cloned());

        // An explicit empty list opts the operation out of global security
        let security = def
            .security
            .clone()
            .unwrap_or_else(|| global_security.to_vec());

        Operation {
            operation_id,
            method,
            path: path.to_string(),
            summary: def.summary.clone(),
            description: def.description.clone(),
            tags: def.tags.clone(),
            deprecated: def.deprecated,
            parameters,
            request_body: def.request_body.clone(),
            responses: def.responses.clone(),
            security,
            servers: def.servers.clone(),
        }
    }

    /// `{method}_{path}` with the lowercase method key
    fn generate_operation_id(path: &str, method: HttpMethod) -> String {
        format!("{}_{}", method.as_key(), path)
    }
}
