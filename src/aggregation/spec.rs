//! Aggregation specifications.

use crate::error::{Result, SagittaError};
use crate::mapping::IndexMapping;

/// A named terms aggregation, optionally carrying one nested aggregation.
///
/// Nesting is capped at depth two by construction: a nested terms level
/// cannot itself nest.
#[derive(Debug, Clone, PartialEq)]
pub struct TermsAggregation {
    name: String,
    field: String,
    size: usize,
    nested: Option<NestedAggregation>,
}

/// The single nested aggregation allowed under a terms bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedAggregation {
    /// A second-level terms bucketing, accumulated per parent bucket.
    Terms {
        name: String,
        field: String,
        size: usize,
    },
    /// Arithmetic mean of a numeric field within each parent bucket.
    Avg { name: String, field: String },
}

impl NestedAggregation {
    /// Get the nested aggregation's name.
    pub fn name(&self) -> &str {
        match self {
            NestedAggregation::Terms { name, .. } => name,
            NestedAggregation::Avg { name, .. } => name,
        }
    }

    /// Get the nested aggregation's field.
    pub fn field(&self) -> &str {
        match self {
            NestedAggregation::Terms { field, .. } => field,
            NestedAggregation::Avg { field, .. } => field,
        }
    }
}

impl TermsAggregation {
    /// Create a terms aggregation bucketing by distinct values of `field`,
    /// keeping the `size` most populous buckets.
    pub fn new<N, F>(mapping: &IndexMapping, name: N, field: F, size: usize) -> Result<Self>
    where
        N: Into<String>,
        F: Into<String>,
    {
        let name = name.into();
        let field = field.into();
        if name.is_empty() {
            return Err(SagittaError::invalid_request(
                "Aggregation name cannot be empty",
            ));
        }
        if size == 0 {
            return Err(SagittaError::invalid_request(
                "Aggregation size must be positive",
            ));
        }
        mapping.resolve(&field)?;
        Ok(TermsAggregation {
            name,
            field,
            size,
            nested: None,
        })
    }

    /// Nest an average metric under each bucket. Replaces any previously
    /// set nested aggregation.
    pub fn with_avg<N, F>(mut self, mapping: &IndexMapping, name: N, field: F) -> Result<Self>
    where
        N: Into<String>,
        F: Into<String>,
    {
        let field = field.into();
        mapping.resolve(&field)?;
        self.nested = Some(NestedAggregation::Avg {
            name: name.into(),
            field,
        });
        Ok(self)
    }

    /// Nest a second terms level under each bucket. Replaces any
    /// previously set nested aggregation. The nested level cannot nest
    /// further.
    pub fn with_terms<N, F>(
        mut self,
        mapping: &IndexMapping,
        name: N,
        field: F,
        size: usize,
    ) -> Result<Self>
    where
        N: Into<String>,
        F: Into<String>,
    {
        let field = field.into();
        if size == 0 {
            return Err(SagittaError::invalid_request(
                "Aggregation size must be positive",
            ));
        }
        mapping.resolve(&field)?;
        self.nested = Some(NestedAggregation::Terms {
            name: name.into(),
            field,
            size,
        });
        Ok(self)
    }

    /// Get the aggregation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the bucketed field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the maximum bucket count.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the nested aggregation, if any.
    pub fn nested(&self) -> Option<&NestedAggregation> {
        self.nested.as_ref()
    }
}
