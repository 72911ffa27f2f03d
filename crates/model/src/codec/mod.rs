//! Codec registry: per-type coercion between application and storage values.
//!
//! Every persisted field passes through a codec selected from its declared
//! [`FieldType`]. The registry is a pure function of that type; codecs are
//! stateless statics and can be used from any thread.
//!
//! | Declared type | Codec | Storage form |
//! |---------------|-------|--------------|
//! | `json` | [`JsonCodec`] | `String` of JSON text, `Null` when empty |
//! | `timestamp` | [`TimestampCodec`] | `Timestamp` |
//! | `list<T>` | [`ListCodec`] | `List`, JSON elements when `T` is `json` |
//! | `set<T>` | [`SetCodec`] | `Set`, JSON elements when `T` is `json` |
//! | `map<K,V>` | [`MapCodec`] | `Map`, keys and values JSON-encoded per marker |
//! | anything else | [`IdentityCodec`] | unchanged |
//!
//! `ignored` fields have no codec: their values never reach the store.
//!
//! # Usage
//!
//! ```
//! use keyline_model::codec::{decode_value, encode_value};
//! use keyline_model::{FieldType, Value};
//!
//! let ty = FieldType::parse("json");
//! let stored = encode_value(&ty, Value::object([("key", "value")])).unwrap();
//! assert_eq!(stored, Value::from(r#"{"key":"value"}"#));
//! assert_eq!(decode_value(&ty, stored).unwrap(), Value::object([("key", "value")]));
//! ```

mod collection;
mod identity;
mod json;
mod timestamp;
mod traits;

pub use collection::{ListCodec, MapCodec, SetCodec};
pub use identity::IdentityCodec;
pub use json::JsonCodec;
pub use timestamp::TimestampCodec;
pub use traits::{CodecError, FieldCodec};

use crate::error::{Error, Result};
use crate::field::{FieldDef, FieldType};
use crate::value::Value;

static IDENTITY: IdentityCodec = IdentityCodec;
static JSON: JsonCodec = JsonCodec;
static TIMESTAMP: TimestampCodec = TimestampCodec;
static LIST: ListCodec = ListCodec::new(false);
static LIST_JSON: ListCodec = ListCodec::new(true);
static SET: SetCodec = SetCodec::new(false);
static SET_JSON: SetCodec = SetCodec::new(true);
static MAP: MapCodec = MapCodec::new(false, false);
static MAP_JSON_KEYS: MapCodec = MapCodec::new(true, false);
static MAP_JSON_VALUES: MapCodec = MapCodec::new(false, true);
static MAP_JSON: MapCodec = MapCodec::new(true, true);

/// Get the codec for a declared type.
///
/// Returns `None` for `ignored` fields.
pub fn codec_for(field_type: &FieldType) -> Option<&'static dyn FieldCodec> {
    let codec: &'static dyn FieldCodec = match field_type {
        FieldType::Ignored => return None,
        FieldType::Json => &JSON,
        FieldType::Timestamp => &TIMESTAMP,
        FieldType::List(e) if e.is_json() => &LIST_JSON,
        FieldType::List(_) => &LIST,
        FieldType::Set(e) if e.is_json() => &SET_JSON,
        FieldType::Set(_) => &SET,
        FieldType::Map(k, v) => match (k.is_json(), v.is_json()) {
            (true, true) => &MAP_JSON,
            (true, false) => &MAP_JSON_KEYS,
            (false, true) => &MAP_JSON_VALUES,
            (false, false) => &MAP,
        },
        FieldType::Text
        | FieldType::Int
        | FieldType::Double
        | FieldType::Boolean
        | FieldType::Other(_) => &IDENTITY,
    };
    Some(codec)
}

/// Encode a value for a declared type; `ignored` passes through.
pub fn encode_value(field_type: &FieldType, value: Value) -> std::result::Result<Value, CodecError> {
    match codec_for(field_type) {
        Some(codec) => codec.encode(value),
        None => Ok(value),
    }
}

/// Decode a stored value for a declared type; `ignored` passes through.
pub fn decode_value(field_type: &FieldType, value: Value) -> std::result::Result<Value, CodecError> {
    match codec_for(field_type) {
        Some(codec) => codec.decode(value),
        None => Ok(value),
    }
}

/// Encode a field value, attaching the field to any failure
pub fn encode_field(field: &FieldDef, value: Value) -> Result<Value> {
    encode_value(field.field_type(), value).map_err(|e| Error::Encode {
        field: field.name().to_string(),
        field_type: field.field_type().to_string(),
        reason: e.to_string(),
    })
}

/// Decode a stored field value, attaching the field to any failure
pub fn decode_field(field: &FieldDef, value: Value) -> Result<Value> {
    decode_value(field.field_type(), value).map_err(|e| Error::Decode {
        field: field.name().to_string(),
        field_type: field.field_type().to_string(),
        reason: e.to_string(),
    })
}
