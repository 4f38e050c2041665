//! Index mapping construction and field lookup.

use ahash::AHashMap;

use crate::error::{Result, SagittaError};
use crate::mapping::field::{EXACT_SUFFIX, FieldSpec};

/// The descriptor of one entity type's index.
///
/// An `IndexMapping` carries the index name, the shard and replica counts
/// (provisioning hints, not enforced at query time), and the ordered list
/// of field declarations. Mappings are constructed once through
/// [`MappingBuilder`] and treated as read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct IndexMapping {
    /// The index name.
    index_name: String,
    /// Number of primary shards for provisioning.
    shards: u32,
    /// Number of replicas for provisioning.
    replicas: u32,
    /// Field declarations in declaration order.
    fields: Vec<FieldSpec>,
    /// Lookup from field name to position in `fields`.
    by_name: AHashMap<String, usize>,
}

impl IndexMapping {
    /// Create a builder for the given index name.
    pub fn builder<S: Into<String>>(index_name: S) -> MappingBuilder {
        MappingBuilder::new(index_name)
    }

    /// Get the index name.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Get the shard count.
    pub fn shards(&self) -> u32 {
        self.shards
    }

    /// Get the replica count.
    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    /// Get all field declarations in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check if a field is declared. Accepts `<field>.exact` references
    /// to the implicit sub-field of analyzed text fields.
    pub fn has_field(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Look up a field declaration by name.
    ///
    /// Fails with [`SagittaError::UnknownField`] if the field is absent.
    pub fn field(&self, name: &str) -> Result<&FieldSpec> {
        self.by_name
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| SagittaError::unknown_field(name))
    }

    /// Resolve a field reference, allowing `<field>.exact` references to
    /// the implicit exact sub-field of an analyzed text field. Returns the
    /// base field declaration.
    pub fn resolve(&self, name: &str) -> Result<&FieldSpec> {
        if let Ok(field) = self.field(name) {
            return Ok(field);
        }
        if let Some(base) = name.strip_suffix(EXACT_SUFFIX)
            && let Ok(field) = self.field(base)
            && field.is_analyzed()
        {
            return Ok(field);
        }
        Err(SagittaError::unknown_field(name))
    }

    /// Name of the exact-match sub-field for the given field.
    ///
    /// For an analyzed text field this is `<name>.exact`; for a keyword
    /// field it is the field itself (already exact).
    pub fn exact_subfield(&self, name: &str) -> Result<String> {
        Ok(self.field(name)?.exact_subfield())
    }
}

/// A builder for constructing index mappings in a fluent manner.
#[derive(Debug)]
pub struct MappingBuilder {
    index_name: String,
    shards: u32,
    replicas: u32,
    fields: Vec<FieldSpec>,
}

impl MappingBuilder {
    /// Create a new mapping builder for the given index name.
    pub fn new<S: Into<String>>(index_name: S) -> Self {
        MappingBuilder {
            index_name: index_name.into(),
            shards: 1,
            replicas: 1,
            fields: Vec::new(),
        }
    }

    /// Set the primary shard count.
    pub fn shards(mut self, shards: u32) -> Self {
        self.shards = shards;
        self
    }

    /// Set the replica count.
    pub fn replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    /// Add a field declaration.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Build the final mapping.
    pub fn build(self) -> Result<IndexMapping> {
        if self.index_name.is_empty() {
            return Err(SagittaError::invalid_request("Index name cannot be empty"));
        }
        if self.shards == 0 {
            return Err(SagittaError::invalid_request(
                "Shard count must be positive",
            ));
        }
        if self.fields.is_empty() {
            return Err(SagittaError::invalid_request(
                "Mapping must declare at least one field",
            ));
        }

        let mut by_name = AHashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if field.name().is_empty() {
                return Err(SagittaError::invalid_request("Field name cannot be empty"));
            }
            if by_name.insert(field.name().to_string(), i).is_some() {
                return Err(SagittaError::invalid_request(format!(
                    "Field '{}' declared twice",
                    field.name()
                )));
            }
        }

        Ok(IndexMapping {
            index_name: self.index_name,
            shards: self.shards,
            replicas: self.replicas,
            fields: self.fields,
            by_name,
        })
    }
}
