//! Table schema and composite primary key
//!
//! A [`TableSchema`] is built once, when the mapping is defined, and is
//! immutable afterward. It is shared by `Arc` between the table gateway, the
//! query planner and every record of the table.
//!
//! ## Invariants (checked by [`TableSchemaBuilder::build`])
//!
//! - Field names are lower-cased and unique
//! - At least one partition-key component exists
//! - Partition and clustering components are declared, persisted fields
//! - Partition and clustering components are disjoint

use crate::error::{Error, Result};
use crate::field::{FieldDef, FieldType};
use std::collections::HashMap;

/// Composite primary key: partition components then clustering components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    partition: Vec<String>,
    clustering: Vec<String>,
}

impl KeySchema {
    /// Create a key schema; names are lower-cased
    pub fn new<P, C, S1, S2>(partition: P, clustering: C) -> Self
    where
        P: IntoIterator<Item = S1>,
        C: IntoIterator<Item = S2>,
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        KeySchema {
            partition: partition
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
            clustering: clustering
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Partition-key components
    pub fn partition(&self) -> &[String] {
        &self.partition
    }

    /// Clustering-key components, in significance order
    pub fn clustering(&self) -> &[String] {
        &self.clustering
    }

    /// Total number of key components
    pub fn len(&self) -> usize {
        self.partition.len() + self.clustering.len()
    }

    /// Whether the key has no components
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All components: partition keys first, then clustering keys
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.partition
            .iter()
            .chain(self.clustering.iter())
            .map(String::as_str)
    }

    /// Whether `name` is any key component
    pub fn contains(&self, name: &str) -> bool {
        self.is_partition(name) || self.is_clustering(name)
    }

    /// Whether `name` is a partition-key component
    pub fn is_partition(&self, name: &str) -> bool {
        self.partition.iter().any(|p| p == name)
    }

    /// Whether `name` is a clustering-key component
    pub fn is_clustering(&self, name: &str) -> bool {
        self.clustering.iter().any(|c| c == name)
    }

    /// Position of `name` among clustering components
    pub fn clustering_position(&self, name: &str) -> Option<usize> {
        self.clustering.iter().position(|c| c == name)
    }
}

/// Immutable description of one mapped table
#[derive(Debug, Clone)]
pub struct TableSchema {
    keyspace: Option<String>,
    table: String,
    fields: Vec<FieldDef>,
    by_name: HashMap<String, usize>,
    key: KeySchema,
    properties: Vec<String>,
}

impl TableSchema {
    /// Start declaring a table
    pub fn builder(table: &str) -> TableSchemaBuilder {
        TableSchemaBuilder {
            keyspace: None,
            table: table.to_lowercase(),
            fields: Vec::new(),
            primary_key: None,
            properties: Vec::new(),
        }
    }

    /// Keyspace, if declared
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// `keyspace.table`, or just `table` without a keyspace
    pub fn qualified_name(&self) -> String {
        match &self.keyspace {
            Some(ks) => format!("{}.{}", ks, self.table),
            None => self.table.clone(),
        }
    }

    /// All declared fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Persisted (non-ignored) fields in declaration order
    pub fn persisted_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_persisted())
    }

    /// Look up a field by name (case-insensitive)
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        let idx = match self.by_name.get(name) {
            Some(idx) => *idx,
            None => *self.by_name.get(&name.to_lowercase())?,
        };
        self.fields.get(idx)
    }

    /// Look up a field, failing with [`Error::UnknownField`]
    pub fn require_field(&self, name: &str) -> Result<&FieldDef> {
        self.field(name).ok_or_else(|| Error::UnknownField {
            field: name.to_lowercase(),
        })
    }

    /// Primary-key layout
    pub fn key(&self) -> &KeySchema {
        &self.key
    }

    /// Table properties for the `WITH` clause of the table definition
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Copy of this schema placed in `keyspace` when none was declared
    pub fn with_default_keyspace(mut self, keyspace: Option<&str>) -> Self {
        if self.keyspace.is_none() {
            self.keyspace = keyspace.map(str::to_lowercase);
        }
        self
    }
}

/// Builder for [`TableSchema`]
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    keyspace: Option<String>,
    table: String,
    fields: Vec<FieldDef>,
    primary_key: Option<KeySchema>,
    properties: Vec<String>,
}

impl TableSchemaBuilder {
    /// Place the table in a keyspace
    pub fn keyspace(mut self, keyspace: &str) -> Self {
        self.keyspace = Some(keyspace.to_lowercase());
        self
    }

    /// Declare a field
    pub fn field(mut self, name: &str, field_type: impl Into<FieldType>) -> Self {
        self.fields.push(FieldDef::new(name, field_type));
        self
    }

    /// Declare a field that is also a partition-key component
    pub fn key_field(mut self, name: &str, field_type: impl Into<FieldType>) -> Self {
        self.fields
            .push(FieldDef::new(name, field_type).partition_key());
        self
    }

    /// Set the full primary key, overriding `key_field` flags
    pub fn primary_key<P, C, S1, S2>(mut self, partition: P, clustering: C) -> Self
    where
        P: IntoIterator<Item = S1>,
        C: IntoIterator<Item = S2>,
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        self.primary_key = Some(KeySchema::new(partition, clustering));
        self
    }

    /// Add a table property (e.g. `gc_grace_seconds = 864000`)
    pub fn property(mut self, property: &str) -> Self {
        self.properties.push(property.to_string());
        self
    }

    /// Validate and freeze the schema
    pub fn build(self) -> Result<TableSchema> {
        if self.table.is_empty() {
            return Err(Error::InvalidSchema("table name is empty".to_string()));
        }

        let mut by_name = HashMap::with_capacity(self.fields.len());
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name().is_empty() {
                return Err(Error::InvalidSchema("field name is empty".to_string()));
            }
            if by_name.insert(field.name().to_string(), idx).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "field '{}' declared twice",
                    field.name()
                )));
            }
        }

        let key = match self.primary_key {
            Some(key) => key,
            None => {
                let partition: Vec<&str> = self
                    .fields
                    .iter()
                    .filter(|f| f.is_partition_key())
                    .map(FieldDef::name)
                    .collect();
                KeySchema::new(partition, Vec::<&str>::new())
            }
        };

        if key.partition().is_empty() {
            return Err(Error::InvalidSchema(format!(
                "table '{}' has no partition key",
                self.table
            )));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(key.len());
        for column in key.columns() {
            match by_name.get(column).map(|idx| &self.fields[*idx]) {
                None => {
                    return Err(Error::InvalidSchema(format!(
                        "key component '{}' is not a declared field",
                        column
                    )))
                }
                Some(field) if !field.is_persisted() => {
                    return Err(Error::InvalidSchema(format!(
                        "key component '{}' is an ignored field",
                        column
                    )))
                }
                Some(_) => {}
            }
            if seen.contains(&column) {
                return Err(Error::InvalidSchema(format!(
                    "key component '{}' appears twice",
                    column
                )));
            }
            seen.push(column);
        }

        // Keep the per-field flag consistent with the final key layout
        let fields = self
            .fields
            .into_iter()
            .map(|f| {
                if key.is_partition(f.name()) && !f.is_partition_key() {
                    f.partition_key()
                } else if !key.is_partition(f.name()) && f.is_partition_key() {
                    FieldDef::new(f.name(), f.field_type().clone())
                } else {
                    f
                }
            })
            .collect();

        Ok(TableSchema {
            keyspace: self.keyspace,
            table: self.table,
            fields,
            by_name,
            key,
            properties: self.properties,
        })
    }
}
