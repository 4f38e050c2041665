//! Query construction for Sagitta.
//!
//! A [`Predicate`] is an immutable tree of search conditions, validated
//! against an [`IndexMapping`](crate::mapping::IndexMapping) at
//! construction time. A [`SearchRequest`] bundles a predicate with
//! pagination, sort, source-field projection, and aggregations, and is
//! serialized losslessly to the engine's JSON query DSL by [`dsl`].

pub mod dsl;
pub mod predicate;
pub mod request;
pub mod wildcard;

pub use predicate::{BoolBuilder, Predicate, RangeBound, RangeBuilder};
pub use request::{SearchRequest, SearchRequestBuilder, Sort, SortOrder};
