//! Source text parsing (JSON or YAML) into a raw JSON tree

use crate::error::{LoadError, LoadResult};
use regex::{Captures, Regex};
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;
use tracing::debug;

/// Parses API description text into an untyped JSON tree
pub struct DocumentParser;

impl DocumentParser {
    /// Parse a document from a string (auto-detects JSON/YAML)
    pub fn parse(content: &str) -> LoadResult<Value> {
        if content.trim_start().starts_with('{') {
            Self::parse_json(content)
        } else {
            Self::parse_yaml(content)
        }
    }

    /// Parse a document from JSON
    pub fn parse_json(content: &str) -> LoadResult<Value> {
        let content = Self::sanitize_large_numbers(content);
        Ok(serde_json::from_str(&content)?)
    }

    /// Parse a document from YAML
    pub fn parse_yaml(content: &str) -> LoadResult<Value> {
        let content = Self::sanitize_large_numbers(content);
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;
        debug!("Parsed YAML document ({} bytes)", content.len());
        yaml_to_json(yaml)
    }

    /// Some descriptions use integers far beyond 64 bits as min/max bounds.
    /// The exact value does not matter for display, so they are clamped to
    /// the 32-bit range before parsing.
    fn sanitize_large_numbers(content: &str) -> String {
        static LARGE: OnceLock<Regex> = OnceLock::new();
        let re = LARGE.get_or_init(|| {
            Regex::new(
                r#"(?m)((?:^\s*|")(?:minimum|maximum|exclusiveMinimum|exclusiveMaximum)"?\s*:\s*)(-?\d{16,})"#,
            )
            .expect("static regex")
        });

        re.replace_all(content, |caps: &Captures| {
            let prefix = &caps[1];
            if caps[2].starts_with('-') {
                format!("{}-2147483648", prefix)
            } else {
                format!("{}2147483647", prefix)
            }
        })
        .into_owned()
    }
}

/// Convert a YAML tree into JSON. Mapping keys that YAML reads as numbers or
/// booleans (`200:` under `responses`) become their string form.
fn yaml_to_json(value: serde_yaml::Value) -> LoadResult<Value> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<LoadResult<Vec<_>>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn yaml_key(key: serde_yaml::Value) -> LoadResult<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(LoadError::InvalidFormat(format!(
            "unsupported mapping key: {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detects_json() {
        let value = DocumentParser::parse(r#"{"openapi": "3.0.0", "paths": {}}"#).unwrap();
        assert_eq!(value["openapi"], "3.0.0");
    }

    #[test]
    fn test_yaml_numeric_keys_become_strings() {
        let yaml = r#"
responses:
  200:
    description: OK
  default:
    description: Error
"#;
        let value = DocumentParser::parse(yaml).unwrap();
        let keys: Vec<&String> = value["responses"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["200", "default"]);
    }

    #[test]
    fn test_sanitize_large_numbers() {
        let yaml = r#"
seed:
  type: integer
  minimum: -92233720368547760000
  maximum: 92233720368547760000
"#;
        let value = DocumentParser::parse_yaml(yaml).unwrap();
        assert_eq!(value["seed"]["minimum"], -2147483648i64);
        assert_eq!(value["seed"]["maximum"], 2147483647i64);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let result = DocumentParser::parse("paths: [unclosed");
        assert!(matches!(result, Err(LoadError::YamlError(_))));
    }
}
