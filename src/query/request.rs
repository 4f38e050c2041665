//! Search request construction.

use crate::aggregation::TermsAggregation;
use crate::error::{Result, SagittaError};
use crate::query::predicate::Predicate;

/// Default page size when none is requested.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// One sort clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub order: SortOrder,
}

impl Sort {
    /// Sort ascending by a field.
    pub fn asc<S: Into<String>>(field: S) -> Self {
        Sort {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Sort descending by a field.
    pub fn desc<S: Into<String>>(field: S) -> Self {
        Sort {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// A complete, validated search request.
///
/// Built through [`SearchRequestBuilder`]; validation happens in
/// [`SearchRequestBuilder::build`], not per mutation. Immutable once
/// built, so reuse by cloning, never by in-place mutation after hand-off.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    predicate: Option<Predicate>,
    page: usize,
    page_size: usize,
    sort: Vec<Sort>,
    source_fields: Vec<String>,
    aggregations: Vec<TermsAggregation>,
}

impl SearchRequest {
    /// Create a builder.
    pub fn builder() -> SearchRequestBuilder {
        SearchRequestBuilder::new()
    }

    /// The predicate, if any. Absent means match-all.
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// The zero-based page index.
    pub fn page(&self) -> usize {
        self.page
    }

    /// The page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The sort clauses, in priority order.
    pub fn sort(&self) -> &[Sort] {
        &self.sort
    }

    /// The source-field projection allow-list. Empty means all fields.
    pub fn source_fields(&self) -> &[String] {
        &self.source_fields
    }

    /// The attached aggregations.
    pub fn aggregations(&self) -> &[TermsAggregation] {
        &self.aggregations
    }
}

/// A builder accumulating the parts of a search request.
#[derive(Debug, Default)]
pub struct SearchRequestBuilder {
    predicate: Option<Predicate>,
    page: usize,
    page_size: Option<usize>,
    sort: Vec<Sort>,
    source_fields: Vec<String>,
    aggregations: Vec<TermsAggregation>,
}

impl SearchRequestBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        SearchRequestBuilder::default()
    }

    /// Set the predicate. Without one the request matches all documents.
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Set the zero-based page index.
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Append a sort clause.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Restrict returned sources to the given fields.
    pub fn source_fields<S: Into<String>, I: IntoIterator<Item = S>>(mut self, fields: I) -> Self {
        self.source_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an aggregation.
    pub fn aggregation(mut self, aggregation: TermsAggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    /// Build the request.
    ///
    /// Fails with [`SagittaError::InvalidRequest`] when the page size is
    /// zero or two aggregations share a name.
    pub fn build(self) -> Result<SearchRequest> {
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(SagittaError::invalid_request("Page size must be positive"));
        }

        for (i, agg) in self.aggregations.iter().enumerate() {
            if self.aggregations[..i].iter().any(|a| a.name() == agg.name()) {
                return Err(SagittaError::invalid_request(format!(
                    "Duplicate aggregation name '{}'",
                    agg.name()
                )));
            }
        }

        Ok(SearchRequest {
            predicate: self.predicate,
            page: self.page,
            page_size,
            sort: self.sort,
            source_fields: self.source_fields,
            aggregations: self.aggregations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldSpec, IndexMapping};

    fn mapping() -> IndexMapping {
        IndexMapping::builder("product")
            .field(FieldSpec::text("name"))
            .field(FieldSpec::keyword("count"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let request = SearchRequest::builder().build().unwrap();

        assert!(request.predicate().is_none());
        assert_eq!(request.page(), 0);
        assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);
        assert!(request.sort().is_empty());
        assert!(request.source_fields().is_empty());
        assert!(request.aggregations().is_empty());
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        assert!(matches!(
            SearchRequest::builder().page_size(0).build(),
            Err(SagittaError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_duplicate_aggregation_names_are_rejected() {
        let mapping = mapping();
        let result = SearchRequest::builder()
            .aggregation(TermsAggregation::new(&mapping, "counts", "count", 10).unwrap())
            .aggregation(TermsAggregation::new(&mapping, "counts", "count", 20).unwrap())
            .build();

        assert!(matches!(result, Err(SagittaError::InvalidRequest(_))));
    }

    #[test]
    fn test_full_request() {
        let mapping = mapping();
        let request = SearchRequest::builder()
            .predicate(Predicate::term(&mapping, "count", 5).unwrap())
            .page(1)
            .page_size(4)
            .sort(Sort::desc("count"))
            .source_fields(["name"])
            .aggregation(TermsAggregation::new(&mapping, "counts", "count", 30).unwrap())
            .build()
            .unwrap();

        assert!(request.predicate().is_some());
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), 4);
        assert_eq!(request.sort(), &[Sort::desc("count")]);
        assert_eq!(request.source_fields(), &["name".to_string()]);
        assert_eq!(request.aggregations().len(), 1);
    }
}
