//! JSON codec: any value at rest as JSON text.

use super::traits::{CodecError, FieldCodec};
use crate::json;
use crate::value::Value;

/// Codec for `json` fields.
///
/// `Null` and the empty string encode to `Null`; everything else encodes to
/// a `String` of plain JSON text. Decoding parses that text back, so values
/// outside the JSON data model read back in their JSON form (see
/// [`crate::json`]): a string-keyed `Map` as an `Object`, a `Set` as a
/// `List`, a `Timestamp` as its RFC 3339 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl FieldCodec for JsonCodec {
    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.is_empty() => Ok(Value::Null),
            other => encode_element(&other),
        }
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::Null => Ok(Value::Null),
            other => decode_element(other),
        }
    }

    fn codec_id(&self) -> &str {
        "json"
    }
}

/// Encode one element of a JSON collection; `Null` becomes `"null"`.
pub(crate) fn encode_element(value: &Value) -> Result<Value, CodecError> {
    json::encode(value)
        .map(Value::String)
        .map_err(CodecError::Unrepresentable)
}

/// Decode one element of a JSON collection.
pub(crate) fn decode_element(value: Value) -> Result<Value, CodecError> {
    match value {
        Value::String(text) => json::decode(&text).map_err(CodecError::Malformed),
        other => Err(CodecError::shape("String", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_object() {
        let encoded = JsonCodec
            .encode(Value::object([("key", "value")]))
            .unwrap();
        assert_eq!(encoded, Value::from(r#"{"key":"value"}"#));
    }

    #[test]
    fn test_absent_and_empty_encode_to_null() {
        assert_eq!(JsonCodec.encode(Value::Null).unwrap(), Value::Null);
        assert_eq!(JsonCodec.encode(Value::from("")).unwrap(), Value::Null);
        assert_eq!(JsonCodec.decode(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_scalar_json() {
        let encoded = JsonCodec.encode(Value::Int(7)).unwrap();
        assert_eq!(encoded, Value::from("7"));
        assert_eq!(JsonCodec.decode(encoded).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_reserved_looking_keys_round_trip() {
        for doc in [
            Value::object([("$bytes", "hello world!")]),
            Value::object([("$ts", 5)]),
        ] {
            let encoded = JsonCodec.encode(doc.clone()).unwrap();
            assert_eq!(JsonCodec.decode(encoded).unwrap(), doc);
        }
    }

    #[test]
    fn test_string_keyed_map_reads_back_as_object() {
        let encoded = JsonCodec.encode(Value::map([("a", 1)])).unwrap();
        assert_eq!(encoded, Value::from(r#"{"a":1}"#));
        assert_eq!(JsonCodec.decode(encoded).unwrap(), Value::object([("a", 1)]));
    }

    #[test]
    fn test_nan_is_unrepresentable() {
        let err = JsonCodec.encode(Value::Float(f64::NAN)).unwrap_err();
        assert!(matches!(err, CodecError::Unrepresentable(_)));
    }

    #[test]
    fn test_malformed_decode_is_an_error() {
        let err = JsonCodec.decode(Value::from("{oops")).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn test_non_string_decode_is_an_error() {
        let err = JsonCodec.decode(Value::Int(1)).unwrap_err();
        assert!(matches!(err, CodecError::Shape { actual: "Int", .. }));
    }
}
