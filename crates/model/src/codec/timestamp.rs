//! Timestamp codec.

use super::traits::{CodecError, FieldCodec};
use crate::timestamp::Timestamp;
use crate::value::Value;

/// Codec for `timestamp` fields.
///
/// Encoding stores the value as given. Decoding normalizes the three shapes
/// a timestamp may arrive in:
/// - `Int`: seconds since Unix epoch, negative before 1970
/// - `String`: a date/time literal, see [`Timestamp::parse`]
/// - `Timestamp`: returned unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec;

impl FieldCodec for TimestampCodec {
    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Timestamp(ts) => Ok(Value::Timestamp(ts)),
            Value::Int(secs) => Timestamp::from_secs(secs)
                .map(Value::Timestamp)
                .ok_or_else(|| CodecError::Malformed(format!("{} seconds is out of range", secs))),
            Value::String(literal) => Timestamp::parse(&literal)
                .map(Value::Timestamp)
                .map_err(|e| CodecError::Malformed(e.to_string())),
            other => Err(CodecError::shape("Int, String or Timestamp", &other)),
        }
    }

    fn codec_id(&self) -> &str {
        "timestamp"
    }
}
