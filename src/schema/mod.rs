use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jsonschema::{Validator, validator_for};
use serde_json::Value;
use tracing::debug;

/// Load a JSON Schema document. Schema files are always JSON.
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;
    let value = serde_json::from_str::<Value>(&contents)
        .with_context(|| format!("failed to parse schema file {} as JSON", path.display()))?;
    debug!(path = %path.display(), "schema loaded");
    Ok(value)
}

/// Compile a schema document into a reusable validator.
pub fn compile_schema(schema: &Value) -> Result<Validator> {
    validator_for(schema).context("failed to compile JSON schema")
}

/// Heuristic for whether a document is shaped like a JSON Schema, used to
/// warn when a plain config is passed where a schema is expected.
pub fn looks_like_json_schema(value: &Value) -> bool {
    let obj = match value.as_object() {
        Some(map) => map,
        None => return false,
    };

    if obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.len())
        .unwrap_or(0)
        == 0
    {
        return false;
    }

    if obj.contains_key("$schema") {
        return true;
    }

    if matches!(obj.get("type"), Some(Value::String(t)) if t == "object") {
        return true;
    }

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        let mut scored = 0usize;
        for value in props.values() {
            if let Some(prop_obj) = value.as_object() {
                if prop_obj.contains_key("type")
                    || prop_obj.contains_key("properties")
                    || prop_obj.contains_key("items")
                    || prop_obj.contains_key("$ref")
                {
                    scored += 1;
                }
            }
        }
        if scored > 0 {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compiles_a_valid_schema() {
        let schema = json!({
            "type": "object",
            "properties": {"port": {"type": "integer"}}
        });
        let validator = compile_schema(&schema).unwrap();
        assert!(validator.is_valid(&json!({"port": 80})));
        assert!(!validator.is_valid(&json!({"port": "eighty"})));
    }

    #[test]
    fn rejects_an_invalid_schema_document() {
        let schema = json!({"type": "not-a-type"});
        assert!(compile_schema(&schema).is_err());
    }

    #[test]
    fn detects_json_schema_shape() {
        let doc = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "username": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string"}}
            }
        });
        assert!(looks_like_json_schema(&doc));
    }

    #[test]
    fn ignores_regular_config_documents() {
        let doc = json!({
            "username": "unic",
            "tags": ["alpha"],
            "properties": "not a schema"
        });
        assert!(!looks_like_json_schema(&doc));
    }
}
