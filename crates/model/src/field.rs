//! Field declarations and their semantic types
//!
//! A field is declared once per table with a type string such as `text`,
//! `timestamp`, `set<json>` or `map<JSON, text>`. Type strings are matched
//! case- and whitespace-insensitively. Anything unrecognised is kept as
//! [`FieldType::Other`] and coerced with the identity rule, so a newer store
//! type can be declared before keyline knows about it.

use std::fmt;
use std::str::FromStr;

/// Element type of a collection field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Elements are JSON-encoded strings at rest
    Json,
    /// Elements are stored as-is (e.g. `text`, `int`)
    Scalar(String),
}

impl ElementType {
    fn parse(s: &str) -> Self {
        match s {
            "json" => ElementType::Json,
            other => ElementType::Scalar(other.to_string()),
        }
    }

    /// Whether elements are JSON-encoded
    pub fn is_json(&self) -> bool {
        matches!(self, ElementType::Json)
    }

    fn store_type(&self) -> &str {
        match self {
            ElementType::Json => "text",
            ElementType::Scalar(s) => s,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Json => f.write_str("json"),
            ElementType::Scalar(s) => f.write_str(s),
        }
    }
}

/// Declared semantic type of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 text
    Text,
    /// Integer
    Int,
    /// Double-precision float
    Double,
    /// Boolean
    Boolean,
    /// Point in time
    Timestamp,
    /// Arbitrary value stored as JSON text
    Json,
    /// Ordered list
    List(ElementType),
    /// Unordered set
    Set(ElementType),
    /// Map from keys to values
    Map(ElementType, ElementType),
    /// Transient attribute, never persisted
    Ignored,
    /// Unrecognised type string, coerced as identity
    Other(String),
}

impl FieldType {
    /// Parse a declared type string; never fails
    pub fn parse(declared: &str) -> Self {
        let normalized: String = declared
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "text" => return FieldType::Text,
            "int" => return FieldType::Int,
            "double" => return FieldType::Double,
            "boolean" => return FieldType::Boolean,
            "timestamp" => return FieldType::Timestamp,
            "json" => return FieldType::Json,
            "ignored" => return FieldType::Ignored,
            _ => {}
        }

        if let Some(inner) = generic_args(&normalized, "list") {
            return FieldType::List(ElementType::parse(inner));
        }
        if let Some(inner) = generic_args(&normalized, "set") {
            return FieldType::Set(ElementType::parse(inner));
        }
        if let Some(inner) = generic_args(&normalized, "map") {
            if let Some((k, v)) = inner.split_once(',') {
                if !k.is_empty() && !v.is_empty() {
                    return FieldType::Map(ElementType::parse(k), ElementType::parse(v));
                }
            }
        }

        FieldType::Other(normalized)
    }

    /// Whether the field is excluded from persistence
    pub fn is_ignored(&self) -> bool {
        matches!(self, FieldType::Ignored)
    }

    /// Column type used in table definitions
    ///
    /// JSON payloads are stored as text. Returns `None` for ignored fields.
    pub fn store_type(&self) -> Option<String> {
        let ty = match self {
            FieldType::Text | FieldType::Json => "text".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Double => "double".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Timestamp => "timestamp".to_string(),
            FieldType::List(e) => format!("list<{}>", e.store_type()),
            FieldType::Set(e) => format!("set<{}>", e.store_type()),
            FieldType::Map(k, v) => format!("map<{},{}>", k.store_type(), v.store_type()),
            FieldType::Other(s) => s.clone(),
            FieldType::Ignored => return None,
        };
        Some(ty)
    }
}

/// Return the text between `name<` and the trailing `>`
fn generic_args<'a>(normalized: &'a str, name: &str) -> Option<&'a str> {
    normalized
        .strip_prefix(name)?
        .strip_prefix('<')?
        .strip_suffix('>')
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldType::parse(s))
    }
}

impl From<&str> for FieldType {
    fn from(s: &str) -> Self {
        FieldType::parse(s)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => f.write_str("text"),
            FieldType::Int => f.write_str("int"),
            FieldType::Double => f.write_str("double"),
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Timestamp => f.write_str("timestamp"),
            FieldType::Json => f.write_str("json"),
            FieldType::Ignored => f.write_str("ignored"),
            FieldType::List(e) => write!(f, "list<{}>", e),
            FieldType::Set(e) => write!(f, "set<{}>", e),
            FieldType::Map(k, v) => write!(f, "map<{},{}>", k, v),
            FieldType::Other(s) => f.write_str(s),
        }
    }
}

/// A declared field: lower-cased name, semantic type, partition-key flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    name: String,
    field_type: FieldType,
    partition_key: bool,
}

impl FieldDef {
    /// Declare a field; the name is lower-cased
    pub fn new(name: &str, field_type: impl Into<FieldType>) -> Self {
        FieldDef {
            name: name.to_lowercase(),
            field_type: field_type.into(),
            partition_key: false,
        }
    }

    /// Mark this field as a partition-key component
    pub fn partition_key(mut self) -> Self {
        self.partition_key = true;
        self
    }

    /// Lower-cased field name (also the column name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared semantic type
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Whether the field was declared as a partition-key component
    pub fn is_partition_key(&self) -> bool {
        self.partition_key
    }

    /// Whether the field is persisted
    pub fn is_persisted(&self) -> bool {
        !self.field_type.is_ignored()
    }
}
