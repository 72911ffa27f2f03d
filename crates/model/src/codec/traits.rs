//! Field codec trait definitions.

use crate::value::Value;

/// Field codec trait.
///
/// Every persisted field value passes through a codec on its way to the
/// store (`encode`) and on its way back to the application (`decode`).
/// One codec exists per semantic type family; the registry in the parent
/// module picks it from the field's declared [`FieldType`](crate::FieldType).
///
/// # Thread Safety
///
/// Codecs must be `Send + Sync`; the registry hands out `'static` shared
/// references used from any thread.
pub trait FieldCodec: Send + Sync {
    /// Convert an application value into its storage form.
    fn encode(&self, value: Value) -> Result<Value, CodecError>;

    /// Convert a storage value back into its application form.
    ///
    /// Reverses `encode`. Returns an error if the stored value is malformed
    /// for this codec.
    fn decode(&self, value: Value) -> Result<Value, CodecError>;

    /// Unique codec identifier.
    fn codec_id(&self) -> &str;
}

/// Codec errors.
///
/// These carry no field context; the registry attaches the field name and
/// declared type when converting into [`crate::Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Stored payload could not be parsed (e.g. invalid JSON).
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Value has no form in the target encoding (e.g. NaN in JSON).
    #[error("unrepresentable value: {0}")]
    Unrepresentable(String),

    /// Value has a shape the codec does not accept.
    #[error("expected {expected}, got {actual}")]
    Shape {
        /// Accepted shape(s)
        expected: &'static str,
        /// Variant actually received
        actual: &'static str,
    },
}

impl CodecError {
    pub(crate) fn shape(expected: &'static str, actual: &Value) -> Self {
        CodecError::Shape {
            expected,
            actual: actual.type_name(),
        }
    }
}
