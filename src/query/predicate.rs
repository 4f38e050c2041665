//! Predicate tree construction and validation.
//!
//! Predicates are built through the constructor functions on
//! [`Predicate`], which validate field references against the index
//! mapping and reject structurally malformed input before anything
//! reaches the engine. Once built, a predicate is immutable.
//!
//! Matching semantics worth keeping in mind:
//!
//! - [`Predicate::term`] and [`Predicate::terms`] on an analyzed text
//!   field compare against the field's stored tokens, so a multi-token
//!   value will generally miss. Target the field's `.exact` sub-field for
//!   whole-value equality.
//! - [`Predicate::prefix`] and [`Predicate::wildcard`] operate on the
//!   literal stored terms of the targeted field: the plain field matches
//!   individual tokens, the `.exact` sub-field matches the whole value.
//! - [`Predicate::multi_match`] analyzes the query string with each
//!   field's own rule and combines per-field scores best-field-first.

use serde_json::Value;

use crate::error::{Result, SagittaError};
use crate::mapping::IndexMapping;
use crate::query::wildcard::compile_wildcard;

/// Engine ceiling for fuzzy edit distance. Larger values are clamped,
/// not rejected.
pub const MAX_FUZZY_EDITS: u32 = 2;

/// One bound of a range predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    /// The bound value.
    pub value: Value,
    /// Whether a field value equal to the bound matches.
    pub inclusive: bool,
}

/// An immutable, composable search condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact term match against the stored terms of a field.
    Term { field: String, value: Value },
    /// OR over several exact terms on one field.
    Terms { field: String, values: Vec<Value> },
    /// A query string matched across several fields, each analyzed by its
    /// own rule. Per-field scores combine best-field-first.
    MultiMatch { query: String, fields: Vec<String> },
    /// Terms starting with a literal prefix.
    Prefix { field: String, prefix: String },
    /// Terms matching a wildcard pattern (`*` = any run, `?` = one char).
    Wildcard { field: String, pattern: String },
    /// Terms within a bounded edit distance of a value.
    Fuzzy {
        field: String,
        value: String,
        max_edits: u32,
    },
    /// Field values within a range. At least one bound is present.
    Range {
        field: String,
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    },
    /// Boolean combination of child predicates.
    ///
    /// `must` = AND (scored), `must_not` = AND NOT, `filter` = AND
    /// (unscored). `should` = OR: at least one should clause must match
    /// when `must` and `filter` are empty, otherwise should clauses only
    /// boost the score.
    Bool {
        must: Vec<Predicate>,
        must_not: Vec<Predicate>,
        should: Vec<Predicate>,
        filter: Vec<Predicate>,
    },
}

impl Predicate {
    /// Create a term predicate.
    pub fn term<F, V>(mapping: &IndexMapping, field: F, value: V) -> Result<Self>
    where
        F: Into<String>,
        V: Into<Value>,
    {
        let field = field.into();
        mapping.resolve(&field)?;
        Ok(Predicate::Term {
            field,
            value: value.into(),
        })
    }

    /// Create a terms predicate matching any of the given values.
    pub fn terms<F, V>(mapping: &IndexMapping, field: F, values: Vec<V>) -> Result<Self>
    where
        F: Into<String>,
        V: Into<Value>,
    {
        let field = field.into();
        mapping.resolve(&field)?;
        if values.is_empty() {
            return Err(SagittaError::invalid_predicate(
                "Terms predicate requires at least one value",
            ));
        }
        Ok(Predicate::Terms {
            field,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Create a multi-match predicate across several fields.
    pub fn multi_match<Q, F>(mapping: &IndexMapping, query: Q, fields: &[F]) -> Result<Self>
    where
        Q: Into<String>,
        F: AsRef<str>,
    {
        if fields.is_empty() {
            return Err(SagittaError::invalid_predicate(
                "MultiMatch predicate requires at least one field",
            ));
        }
        let mut names = Vec::with_capacity(fields.len());
        for field in fields {
            mapping.resolve(field.as_ref())?;
            names.push(field.as_ref().to_string());
        }
        Ok(Predicate::MultiMatch {
            query: query.into(),
            fields: names,
        })
    }

    /// Create a prefix predicate.
    pub fn prefix<F, P>(mapping: &IndexMapping, field: F, prefix: P) -> Result<Self>
    where
        F: Into<String>,
        P: Into<String>,
    {
        let field = field.into();
        mapping.resolve(&field)?;
        Ok(Predicate::Prefix {
            field,
            prefix: prefix.into(),
        })
    }

    /// Create a wildcard predicate. The pattern is compiled eagerly so a
    /// malformed pattern fails here, not at the engine.
    pub fn wildcard<F, P>(mapping: &IndexMapping, field: F, pattern: P) -> Result<Self>
    where
        F: Into<String>,
        P: Into<String>,
    {
        let field = field.into();
        let pattern = pattern.into();
        mapping.resolve(&field)?;
        compile_wildcard(&pattern)?;
        Ok(Predicate::Wildcard { field, pattern })
    }

    /// Create a fuzzy predicate. `max_edits` beyond the engine ceiling is
    /// clamped to [`MAX_FUZZY_EDITS`], not rejected.
    pub fn fuzzy<F, V>(mapping: &IndexMapping, field: F, value: V, max_edits: u32) -> Result<Self>
    where
        F: Into<String>,
        V: Into<String>,
    {
        let field = field.into();
        mapping.resolve(&field)?;
        Ok(Predicate::Fuzzy {
            field,
            value: value.into(),
            max_edits: max_edits.min(MAX_FUZZY_EDITS),
        })
    }

    /// Start building a range predicate. Bounds default to inclusive;
    /// at least one bound must be supplied before [`RangeBuilder::build`].
    pub fn range<F: Into<String>>(mapping: &IndexMapping, field: F) -> Result<RangeBuilder> {
        let field = field.into();
        mapping.resolve(&field)?;
        Ok(RangeBuilder {
            field,
            lower: None,
            upper: None,
        })
    }

    /// Start building a boolean combination of predicates.
    pub fn bool() -> BoolBuilder {
        BoolBuilder::new()
    }
}

/// A builder for range predicates.
#[derive(Debug)]
pub struct RangeBuilder {
    field: String,
    lower: Option<RangeBound>,
    upper: Option<RangeBound>,
}

impl RangeBuilder {
    /// Set an inclusive lower bound.
    pub fn gte<V: Into<Value>>(mut self, value: V) -> Self {
        self.lower = Some(RangeBound {
            value: value.into(),
            inclusive: true,
        });
        self
    }

    /// Set an exclusive lower bound.
    pub fn gt<V: Into<Value>>(mut self, value: V) -> Self {
        self.lower = Some(RangeBound {
            value: value.into(),
            inclusive: false,
        });
        self
    }

    /// Set an inclusive upper bound.
    pub fn lte<V: Into<Value>>(mut self, value: V) -> Self {
        self.upper = Some(RangeBound {
            value: value.into(),
            inclusive: true,
        });
        self
    }

    /// Set an exclusive upper bound.
    pub fn lt<V: Into<Value>>(mut self, value: V) -> Self {
        self.upper = Some(RangeBound {
            value: value.into(),
            inclusive: false,
        });
        self
    }

    /// Build the range predicate.
    ///
    /// Fails with [`SagittaError::InvalidPredicate`] when no bound was
    /// supplied.
    pub fn build(self) -> Result<Predicate> {
        if self.lower.is_none() && self.upper.is_none() {
            return Err(SagittaError::invalid_predicate(
                "Range predicate requires at least one bound",
            ));
        }
        Ok(Predicate::Range {
            field: self.field,
            lower: self.lower,
            upper: self.upper,
        })
    }
}

/// A builder for boolean predicate combinations.
#[derive(Debug, Default)]
pub struct BoolBuilder {
    must: Vec<Predicate>,
    must_not: Vec<Predicate>,
    should: Vec<Predicate>,
    filter: Vec<Predicate>,
}

impl BoolBuilder {
    /// Create an empty boolean builder.
    pub fn new() -> Self {
        BoolBuilder::default()
    }

    /// Add a MUST clause (AND, contributes to score).
    pub fn must(mut self, predicate: Predicate) -> Self {
        self.must.push(predicate);
        self
    }

    /// Add a MUST_NOT clause (AND NOT).
    pub fn must_not(mut self, predicate: Predicate) -> Self {
        self.must_not.push(predicate);
        self
    }

    /// Add a SHOULD clause (OR).
    pub fn should(mut self, predicate: Predicate) -> Self {
        self.should.push(predicate);
        self
    }

    /// Add a FILTER clause (AND, does not affect score).
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }

    /// Build the boolean predicate.
    ///
    /// Fails with [`SagittaError::InvalidPredicate`] when every clause
    /// list is empty.
    pub fn build(self) -> Result<Predicate> {
        if self.must.is_empty()
            && self.must_not.is_empty()
            && self.should.is_empty()
            && self.filter.is_empty()
        {
            return Err(SagittaError::invalid_predicate(
                "Bool predicate requires at least one clause",
            ));
        }
        Ok(Predicate::Bool {
            must: self.must,
            must_not: self.must_not,
            should: self.should,
            filter: self.filter,
        })
    }
}
