//! Identity codec (no transformation).
//!
//! Used for scalar types (`text`, `int`, `double`, `boolean`) and for any
//! type string keyline does not recognise.

use super::traits::{CodecError, FieldCodec};
use crate::value::Value;

/// Identity codec - values pass through unchanged.
///
/// # Example
///
/// ```
/// use keyline_model::codec::{FieldCodec, IdentityCodec};
/// use keyline_model::Value;
///
/// let codec = IdentityCodec;
/// let encoded = codec.encode(Value::Int(33)).unwrap();
/// assert_eq!(encoded, Value::Int(33));
/// assert_eq!(codec.decode(encoded).unwrap(), Value::Int(33));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl FieldCodec for IdentityCodec {
    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }

    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }

    fn codec_id(&self) -> &str {
        "identity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_roundtrip() {
        let codec = IdentityCodec;
        let value = Value::map([("k", 1)]);
        let decoded = codec.decode(codec.encode(value.clone()).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_identity_keeps_null() {
        assert_eq!(IdentityCodec.decode(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_identity_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IdentityCodec>();
    }
}
