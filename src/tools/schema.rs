//! Minimal JSON-Schema checks for tool parameters.
//!
//! Only the subset tools actually declare is understood: an object schema with
//! typed `properties`, a `required` list and optional `additionalProperties: false`.

use serde_json::{Map, Value};

/// Check that a tool's parameter schema is something the model can satisfy.
pub fn check_schema(schema: &Value) -> Result<(), String> {
    let obj = schema
        .as_object()
        .ok_or_else(|| "schema must be a JSON object".to_string())?;

    if obj.get("type").and_then(Value::as_str) != Some("object") {
        return Err("schema type must be \"object\"".to_string());
    }

    let empty = Map::new();
    let properties = match obj.get("properties") {
        None => &empty,
        Some(Value::Object(props)) => props,
        Some(_) => return Err("\"properties\" must be an object".to_string()),
    };

    for (name, prop) in properties {
        if let Some(ty) = prop.get("type") {
            for t in type_names(ty) {
                if !KNOWN_TYPES.contains(&t) {
                    return Err(format!("property '{}' has unknown type '{}'", name, t));
                }
            }
        }
    }

    for key in required_keys(obj) {
        if !properties.contains_key(key) {
            return Err(format!("required property '{}' is not declared", key));
        }
    }

    Ok(())
}

/// Validate tool-call arguments against a parameter schema.
///
/// A `null` argument value is treated as an empty object, since models commonly
/// send nothing for zero-argument tools.
pub fn validate_arguments(schema: &Value, args: &Value) -> Result<(), String> {
    let empty = Map::new();
    let args = match args {
        Value::Null => &empty,
        Value::Object(map) => map,
        Value::String(raw) => {
            return Err(format!("arguments are not valid JSON: {}", raw));
        }
        other => {
            return Err(format!(
                "arguments must be a JSON object, got {}",
                json_type(other)
            ))
        }
    };

    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    for key in required_keys(schema) {
        match args.get(key) {
            None | Some(Value::Null) => {
                return Err(format!("missing required argument '{}'", key));
            }
            Some(_) => {}
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (key, value) in args {
        let Some(prop) = properties.and_then(|p| p.get(key)) else {
            if closed {
                return Err(format!("unexpected argument '{}'", key));
            }
            continue;
        };
        let Some(ty) = prop.get("type") else {
            continue;
        };
        let allowed = type_names(ty);
        if !allowed.iter().any(|t| matches_type(t, value)) {
            return Err(format!(
                "argument '{}' must be {}, got {}",
                key,
                allowed.join(" or "),
                json_type(value)
            ));
        }
    }

    Ok(())
}

const KNOWN_TYPES: &[&str] = &[
    "string", "integer", "number", "boolean", "array", "object", "null",
];

fn required_keys(schema: &Map<String, Value>) -> impl Iterator<Item = &str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

fn type_names(ty: &Value) -> Vec<&str> {
    match ty {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn matches_type(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => false,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn email_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "email_address": {"type": "string"},
                "subject": {"type": "string"},
                "retries": {"type": "integer"}
            },
            "required": ["email_address", "subject"],
            "additionalProperties": false
        })
    }

    #[test]
    fn accepts_well_formed_arguments() {
        let args = json!({"email_address": "a@b.c", "subject": "hi", "retries": 2});
        assert!(validate_arguments(&email_schema(), &args).is_ok());
    }

    #[test]
    fn reports_missing_required_argument() {
        let err = validate_arguments(&email_schema(), &json!({"subject": "hi"})).unwrap_err();
        assert!(err.contains("email_address"), "{err}");
    }

    #[test]
    fn reports_type_mismatch() {
        let args = json!({"email_address": "a@b.c", "subject": "hi", "retries": "two"});
        let err = validate_arguments(&email_schema(), &args).unwrap_err();
        assert_eq!(err, "argument 'retries' must be integer, got string");
    }

    #[test]
    fn rejects_unknown_keys_on_closed_schema() {
        let args = json!({"email_address": "a@b.c", "subject": "hi", "cc": "x@y.z"});
        let err = validate_arguments(&email_schema(), &args).unwrap_err();
        assert!(err.contains("'cc'"), "{err}");
    }

    #[test]
    fn null_arguments_satisfy_empty_schema() {
        let schema = json!({"type": "object", "properties": {}});
        assert!(validate_arguments(&schema, &Value::Null).is_ok());
    }

    #[test]
    fn raw_string_arguments_are_rejected() {
        let schema = json!({"type": "object", "properties": {}});
        let err = validate_arguments(&schema, &json!("{not json")).unwrap_err();
        assert!(err.starts_with("arguments are not valid JSON"));
    }

    #[test]
    fn schema_check_catches_undeclared_required() {
        let schema = json!({"type": "object", "properties": {}, "required": ["url"]});
        assert!(check_schema(&schema).is_err());
        assert!(check_schema(&email_schema()).is_ok());
        assert!(check_schema(&json!({"type": "string"})).is_err());
    }
}
