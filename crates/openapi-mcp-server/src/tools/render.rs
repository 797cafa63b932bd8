//! Plain-text rendering of store answers

use indexmap::IndexMap;
use openapi_index::{
    format_compact, simplify, Example, Generation, MediaType, Operation, Schema,
    SecurityRequirement, SimplifyOptions,
};

/// Simplified schema as pretty JSON, or as a one-line summary
pub fn schema_text(schema: &Schema, compact: bool, options: &SimplifyOptions) -> String {
    let simplified = simplify(schema, options);
    if compact {
        format_compact(&simplified)
    } else {
        simplified.to_pretty_json()
    }
}

pub fn api_info(generation: &Generation) -> String {
    let document = &generation.document;
    let metadata = &generation.metadata;

    let mut lines = vec![
        format!("Title: {}", metadata.title),
        format!("Version: {}", metadata.version),
        format!("OpenAPI: {}", document.openapi),
        format!("Source: {}", metadata.path),
        format!("Loaded: {}", metadata.loaded_at.to_rfc3339()),
    ];
    if let Some(description) = &metadata.description {
        lines.push(format!("Description: {}", description));
    }
    lines.push(format!("Operations: {}", generation.operations.len()));
    lines.push(format!("Schemas: {}", document.schemas.len()));

    if !document.servers.is_empty() {
        lines.push(String::new());
        lines.push("Servers:".to_string());
        for server in &document.servers {
            match &server.description {
                Some(description) => lines.push(format!("- {} ({})", server.url, description)),
                None => lines.push(format!("- {}", server.url)),
            }
        }
    }

    if !document.security_schemes.is_empty() {
        lines.push(String::new());
        lines.push("Security schemes:".to_string());
        for (name, scheme) in &document.security_schemes {
            lines.push(format!("- {}: {}", name, scheme.describe()));
        }
    }

    if !document.security.is_empty() {
        lines.push(String::new());
        lines.push(format!("Global security: {}", security(&document.security)));
    }

    lines.join("\n")
}

pub fn operation_list(operations: &[&Operation], filter: Option<&str>) -> String {
    let mut out = match filter.filter(|f| !f.is_empty()) {
        Some(filter) => format!("{} operations matching \"{}\"\n", operations.len(), filter),
        None => format!("{} operations\n", operations.len()),
    };
    for op in operations {
        out.push_str(&format!("\n{} {}", op.method, op.path));
        if let Some(summary) = &op.summary {
            out.push_str(&format!(" - {}", summary));
        }
        out.push_str(&format!(" ({})", op.operation_id));
        if op.deprecated {
            out.push_str(" [deprecated]");
        }
    }
    out
}

pub fn operation(generation: &Generation, op: &Operation) -> String {
    let mut lines = vec![
        format!("{} {}", op.method, op.path),
        format!("Operation ID: {}", op.operation_id),
    ];
    if let Some(summary) = &op.summary {
        lines.push(format!("Summary: {}", summary));
    }
    if let Some(description) = &op.description {
        lines.push(format!("Description: {}", description));
    }
    if !op.tags.is_empty() {
        lines.push(format!("Tags: {}", op.tags.join(", ")));
    }
    if op.deprecated {
        lines.push("Deprecated: yes".to_string());
    }

    lines.push(String::new());
    if op.parameters.is_empty() {
        lines.push("Parameters: none".to_string());
    } else {
        lines.push("Parameters:".to_string());
        for param in &op.parameters {
            let mut line = format!(
                "- {} ({}{})",
                param.name,
                param.location.as_str(),
                if param.required { ", required" } else { "" }
            );
            if let Some(id) = param.schema {
                line.push_str(&format!(": {}", format_compact(&generation.schema(id))));
            }
            if let Some(description) = &param.description {
                line.push_str(&format!(" - {}", description));
            }
            if param.deprecated {
                line.push_str(" [deprecated]");
            }
            lines.push(line);
        }
    }

    lines.push(String::new());
    match &op.request_body {
        None => lines.push("Request body: none".to_string()),
        Some(body) => {
            lines.push(format!(
                "Request body{}:",
                if body.required { " (required)" } else { "" }
            ));
            lines.extend(content_lines(generation, &body.content));
        }
    }

    lines.push(String::new());
    lines.push("Responses:".to_string());
    for (status, response) in &op.responses {
        lines.push(format!(
            "- {}: {}",
            status,
            response.description.as_deref().unwrap_or("")
        ));
        lines.extend(content_lines(generation, &response.content).map(|l| format!("  {}", l)));
    }

    lines.push(String::new());
    lines.push(format!("Security: {}", security(&op.security)));
    if let Some(servers) = &op.servers {
        let urls: Vec<&str> = servers.iter().map(|s| s.url.as_str()).collect();
        lines.push(format!("Servers: {}", urls.join(", ")));
    }

    lines.join("\n")
}

fn content_lines<'a>(
    generation: &'a Generation,
    content: &'a IndexMap<String, MediaType>,
) -> impl Iterator<Item = String> + 'a {
    content.iter().map(move |(content_type, media)| match media.schema {
        Some(id) => format!("- {}: {}", content_type, format_compact(&generation.schema(id))),
        None => format!("- {}", content_type),
    })
}

/// `a + b[scope] or c`; an empty list is `none`
pub fn security(requirements: &[SecurityRequirement]) -> String {
    if requirements.is_empty() {
        return "none".to_string();
    }
    requirements
        .iter()
        .map(|requirement| {
            if requirement.is_empty() {
                return "anonymous".to_string();
            }
            requirement
                .iter()
                .map(|(scheme, scopes)| {
                    if scopes.is_empty() {
                        scheme.clone()
                    } else {
                        format!("{}[{}]", scheme, scopes.join(", "))
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        })
        .collect::<Vec<_>>()
        .join(" or ")
}

pub fn examples(operation_id: &str, examples: &[(String, Example)]) -> String {
    let mut out = format!("{} examples for {}\n", examples.len(), operation_id);
    for (key, example) in examples {
        out.push_str(&format!("\n## {}\n", key));
        if let Some(summary) = &example.summary {
            out.push_str(&format!("{}\n", summary));
        }
        let value = serde_json::to_string_pretty(&example.value).unwrap_or_default();
        out.push_str(&format!("```json\n{}\n```\n", value));
    }
    out
}

pub fn schema_names(names: &[String]) -> String {
    let mut out = format!("{} schemas\n", names.len());
    for name in names {
        out.push_str(&format!("\n- {}", name));
    }
    out
}

pub fn tags(tags: &IndexMap<String, usize>) -> String {
    if tags.is_empty() {
        return "No tags defined".to_string();
    }
    tags.iter()
        .map(|(tag, count)| {
            format!(
                "{}: {} operation{}",
                tag,
                count,
                if *count == 1 { "" } else { "s" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[test]
    fn test_security_rendering() {
        assert_eq!(security(&[]), "none");
        let requirements = vec![
            indexmap! {
                "oauth".to_string() => vec!["read".to_string(), "write".to_string()],
                "apiKey".to_string() => vec![],
            },
            indexmap! { "bearer".to_string() => vec![] },
            IndexMap::new(),
        ];
        assert_eq!(
            security(&requirements),
            "oauth[read, write] + apiKey or bearer or anonymous"
        );
    }

    #[test]
    fn test_tags_rendering() {
        let tags = indexmap! { "pets".to_string() => 2, "store".to_string() => 1 };
        assert_eq!(super::tags(&tags), "pets: 2 operations\nstore: 1 operation");
        assert_eq!(super::tags(&IndexMap::new()), "No tags defined");
    }
}
