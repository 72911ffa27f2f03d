//! JSON text for values stored in `json` columns, and JSON export.
//!
//! Columns hold plain JSON, readable by any producer or consumer: no key is
//! reserved, so a document such as `{"$ts": 5}` reads back as itself.
//! Application values outside the JSON data model are converted when
//! written, and read back in their JSON form:
//!
//! | Application value | Stored as | Reads back as |
//! |-------------------|-----------|---------------|
//! | `Set` | array | `List` |
//! | `Map` with string keys | object | `Object` |
//! | `Timestamp` | RFC 3339 string | `String` |
//! | `Bytes` | base64 string | `String` |
//!
//! A `Map` with non-string keys and a non-finite float have no JSON form
//! and are rejected on write.
//!
//! Object keys are emitted in sorted order, so equal values always produce
//! identical text.

use crate::value::Value;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::Value as JsonValue;

/// Serialize a value to canonical JSON text.
pub fn encode(value: &Value) -> Result<String, String> {
    to_plain(value).map(|json| json.to_string())
}

/// Parse JSON text back into a value.
pub fn decode(text: &str) -> Result<Value, String> {
    let json: JsonValue = serde_json::from_str(text).map_err(|e| e.to_string())?;
    Ok(Value::from(json))
}

/// The value a `json` column hands back for `value`
///
/// Equal to `decode(encode(value))` without the text round trip.
pub fn normalize(value: &Value) -> Result<Value, String> {
    to_plain(value).map(Value::from)
}

/// Convert a value to plain JSON, failing on values with no JSON form.
pub fn to_plain(value: &Value) -> Result<JsonValue, String> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| format!("{} has no JSON form", f))?,
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(b) => JsonValue::String(BASE64.encode(b)),
        Value::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
        Value::List(items) | Value::Set(items) => {
            JsonValue::Array(items.iter().map(to_plain).collect::<Result<_, _>>()?)
        }
        Value::Map(pairs) => {
            let mut obj = serde_json::Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = k
                    .as_str()
                    .ok_or_else(|| format!("map key of type {} has no JSON form", k.type_name()))?;
                obj.insert(key.to_string(), to_plain(v)?);
            }
            JsonValue::Object(obj)
        }
        Value::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| to_plain(v).map(|v| (k.clone(), v)))
                .collect::<Result<_, _>>()?,
        ),
    })
}

/// Convert a value to JSON for export; never fails.
///
/// Like [`to_plain`], except a map with non-string keys becomes
/// `{"$map": [[key, value], ...]}` and a non-finite float becomes `null`.
/// The result is meant for display and interchange, not for storage.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::List(items) | Value::Set(items) => {
            JsonValue::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(pairs) if pairs.iter().all(|(k, _)| k.as_str().is_some()) => JsonValue::Object(
            pairs
                .iter()
                .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), value_to_json(v))))
                .collect(),
        ),
        Value::Map(pairs) => {
            let entries: Vec<JsonValue> = pairs
                .iter()
                .map(|(k, v)| JsonValue::Array(vec![value_to_json(k), value_to_json(v)]))
                .collect();
            serde_json::json!({ "$map": entries })
        }
        Value::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
        scalar => to_plain(scalar).unwrap_or(JsonValue::Null),
    }
}
