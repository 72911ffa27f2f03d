//! Typed records
//!
//! A [`Record`] holds storage-form column values for one row of a mapped
//! table. Values assigned through [`Record::set`] are encoded immediately;
//! values hydrated from a store [`Row`] are kept as stored. Reads always go
//! through the decode path, so both kinds of record read the same way.
//!
//! The last raw value assigned to each field is kept alongside the encoded
//! column for mutation tracking (see [`Record::persisted_columns`]).

use crate::codec::{decode_field, encode_field};
use crate::error::Result;
use crate::field::FieldDef;
use crate::json;
use crate::row::Row;
use crate::schema::TableSchema;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One row of a mapped table
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<TableSchema>,
    columns: HashMap<String, Value>,
    raw: HashMap<String, Value>,
}

impl Record {
    /// Empty record of `schema`
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Record {
            schema,
            columns: HashMap::new(),
            raw: HashMap::new(),
        }
    }

    /// Build a record from raw application values
    ///
    /// Fails on the first undeclared name or value that does not fit its
    /// declared type.
    pub fn from_pairs<I, K, V>(schema: Arc<TableSchema>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Record::new(schema);
        for (name, value) in pairs {
            record.set(name.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Hydrate a record from a store row
    ///
    /// Columns the schema does not declare are dropped. Nothing is decoded
    /// until a field is read.
    pub fn from_row(schema: Arc<TableSchema>, row: Row) -> Self {
        let columns = row
            .into_columns()
            .into_iter()
            .filter(|(name, _)| schema.field(name).is_some())
            .collect();
        Record {
            schema,
            columns,
            raw: HashMap::new(),
        }
    }

    /// Table schema this record belongs to
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Assign a raw value, encoding it for the field's declared type
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let field = self.schema.require_field(name)?;
        let value = value.into();
        let encoded = encode_field(field, value.clone())?;
        let name = field.name().to_string();
        self.raw.insert(name.clone(), value);
        self.columns.insert(name, encoded);
        Ok(())
    }

    /// Read a field, decoded for its declared type
    ///
    /// An unset field decodes from `Null`: absent scalars read as `Null`,
    /// absent collections as empty ones.
    pub fn get(&self, name: &str) -> Result<Value> {
        let field = self.schema.require_field(name)?;
        self.decode(field)
    }

    /// Storage-form value of a column, if set
    pub fn column(&self, name: &str) -> Option<&Value> {
        let field = self.schema.field(name)?;
        self.columns.get(field.name())
    }

    /// Last raw value assigned to a field
    pub fn raw(&self, name: &str) -> Option<&Value> {
        let field = self.schema.field(name)?;
        self.raw.get(field.name())
    }

    /// Whether any field was assigned through [`Record::set`]
    pub fn has_raw_values(&self) -> bool {
        !self.raw.is_empty()
    }

    /// Decoded `(name, value)` pairs in declaration order, skipping ignored fields
    pub fn iter(&self) -> RecordIter<'_> {
        RecordIter {
            record: self,
            fields: self.schema.fields().iter(),
        }
    }

    /// Decoded non-ignored fields, in declaration order
    pub fn to_map(&self) -> Result<Vec<(String, Value)>> {
        self.iter()
            .map(|entry| entry.map(|(name, value)| (name.to_string(), value)))
            .collect()
    }

    /// Decoded non-ignored fields as a JSON object with sorted keys
    pub fn to_json(&self) -> Result<String> {
        let mut obj = serde_json::Map::new();
        for entry in self.iter() {
            let (name, value) = entry?;
            obj.insert(name.to_string(), json::value_to_json(&value));
        }
        Ok(serde_json::Value::Object(obj).to_string())
    }

    /// Primary-key projection: storage values of every key component,
    /// partition keys first, then clustering keys
    ///
    /// Unset components project as `Null`.
    pub fn primary_key(&self) -> Vec<(String, Value)> {
        self.schema
            .key()
            .columns()
            .map(|name| {
                let value = self.columns.get(name).cloned().unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect()
    }

    /// Whether both records address the same stored row
    pub fn same_row(&self, other: &Record) -> bool {
        self.schema.qualified_name() == other.schema.qualified_name()
            && self.primary_key() == other.primary_key()
    }

    /// Columns to write, in declaration order, with storage values
    ///
    /// With `exclude_nulls`, a column is kept only when its source value is
    /// non-null. The source is the raw value when any raw values were
    /// assigned, otherwise the stored column.
    pub fn persisted_columns(&self, exclude_nulls: bool) -> Vec<(String, Value)> {
        let from_raw = self.has_raw_values();
        self.schema
            .persisted_fields()
            .filter(|field| {
                if !exclude_nulls {
                    return true;
                }
                let source = if from_raw {
                    self.raw.get(field.name())
                } else {
                    self.columns.get(field.name())
                };
                source.map_or(false, |v| !v.is_null())
            })
            .map(|field| {
                let value = self
                    .columns
                    .get(field.name())
                    .cloned()
                    .unwrap_or(Value::Null);
                (field.name().to_string(), value)
            })
            .collect()
    }

    fn decode(&self, field: &FieldDef) -> Result<Value> {
        let stored = self
            .columns
            .get(field.name())
            .cloned()
            .unwrap_or(Value::Null);
        decode_field(field, stored)
    }
}

/// Iterator over a record's decoded fields
///
/// Yields `Err` for a field whose stored value fails to decode.
pub struct RecordIter<'a> {
    record: &'a Record,
    fields: std::slice::Iter<'a, FieldDef>,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<(&'a str, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        let field = self.fields.find(|f| f.is_persisted())?;
        Some(self.record.decode(field).map(|v| (field.name(), v)))
    }
}
