//! Collection codecs: `list<T>`, `set<T>` and `map<K,V>`.
//!
//! A collection whose element type is `json` encodes each element on its own
//! with the JSON rule; scalar elements pass through. Absent collections
//! (`Null`) always come back as empty ones.

use super::json::{decode_element, encode_element};
use super::traits::{CodecError, FieldCodec};
use crate::value::Value;

/// Codec for `list<T>` fields.
#[derive(Debug, Clone, Copy)]
pub struct ListCodec {
    json: bool,
}

impl ListCodec {
    /// List codec; `json` selects JSON-encoded elements
    pub const fn new(json: bool) -> Self {
        ListCodec { json }
    }
}

impl FieldCodec for ListCodec {
    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        let items = elements(value)?;
        if self.json {
            let encoded: Result<Vec<Value>, CodecError> = items.iter().map(encode_element).collect();
            Ok(Value::List(encoded?))
        } else {
            Ok(Value::List(items))
        }
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        let items = elements(value)?;
        if self.json {
            let decoded: Result<Vec<Value>, CodecError> =
                items.into_iter().map(decode_element).collect();
            Ok(Value::List(decoded?))
        } else {
            Ok(Value::List(items))
        }
    }

    fn codec_id(&self) -> &str {
        if self.json {
            "list<json>"
        } else {
            "list"
        }
    }
}

/// Codec for `set<T>` fields.
///
/// Both directions de-duplicate by element equality; for `set<json>` the
/// decoded values are compared, so two spellings of the same document
/// collapse into one element.
#[derive(Debug, Clone, Copy)]
pub struct SetCodec {
    json: bool,
}

impl SetCodec {
    /// Set codec; `json` selects JSON-encoded elements
    pub const fn new(json: bool) -> Self {
        SetCodec { json }
    }
}

impl FieldCodec for SetCodec {
    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        let items = elements(value)?;
        if self.json {
            let encoded: Result<Vec<Value>, CodecError> = items.iter().map(encode_element).collect();
            Ok(Value::set(encoded?))
        } else {
            Ok(Value::set(items))
        }
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        let items = elements(value)?;
        if self.json {
            let decoded: Result<Vec<Value>, CodecError> =
                items.into_iter().map(decode_element).collect();
            Ok(Value::set(decoded?))
        } else {
            Ok(Value::set(items))
        }
    }

    fn codec_id(&self) -> &str {
        if self.json {
            "set<json>"
        } else {
            "set"
        }
    }
}

/// Codec for `map<K,V>` fields.
///
/// Keys and values are JSON-encoded independently, each according to its
/// own marker; pairing is preserved.
#[derive(Debug, Clone, Copy)]
pub struct MapCodec {
    json_keys: bool,
    json_values: bool,
}

impl MapCodec {
    /// Map codec with independent JSON markers for keys and values
    pub const fn new(json_keys: bool, json_values: bool) -> Self {
        MapCodec {
            json_keys,
            json_values,
        }
    }
}

impl FieldCodec for MapCodec {
    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        let pairs = pairs(value)?;
        if !self.json_keys && !self.json_values {
            return Ok(Value::Map(pairs));
        }
        let mut encoded = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let k = if self.json_keys { encode_element(&k)? } else { k };
            let v = if self.json_values { encode_element(&v)? } else { v };
            encoded.push((k, v));
        }
        Ok(Value::map(encoded))
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        let pairs = pairs(value)?;
        if !self.json_keys && !self.json_values {
            return Ok(Value::Map(pairs));
        }
        let mut decoded = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let k = if self.json_keys { decode_element(k)? } else { k };
            let v = if self.json_values { decode_element(v)? } else { v };
            decoded.push((k, v));
        }
        Ok(Value::map(decoded))
    }

    fn codec_id(&self) -> &str {
        match (self.json_keys, self.json_values) {
            (true, true) => "map<json,json>",
            (true, false) => "map<json,_>",
            (false, true) => "map<_,json>",
            (false, false) => "map",
        }
    }
}

/// Elements of a List or Set; `Null` is an empty sequence
fn elements(value: Value) -> Result<Vec<Value>, CodecError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::List(items) | Value::Set(items) => Ok(items),
        other => Err(CodecError::shape("List or Set", &other)),
    }
}

/// Pairs of a Map or Object; `Null` is an empty map
fn pairs(value: Value) -> Result<Vec<(Value, Value)>, CodecError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Map(pairs) => Ok(pairs),
        Value::Object(obj) => Ok(obj.into_iter().map(|(k, v)| (Value::String(k), v)).collect()),
        other => Err(CodecError::shape("Map or Object", &other)),
    }
}
