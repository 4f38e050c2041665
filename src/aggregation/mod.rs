//! Aggregations: bucketing specifications and typed result decoding.
//!
//! A [`TermsAggregation`] buckets documents by distinct values of a field,
//! ordered by descending document count (ties broken by ascending key for
//! determinism) and truncated to `size` buckets. One level of nesting is
//! supported: either an [`NestedAggregation::Avg`] metric or a second
//! [`NestedAggregation::Terms`] level, accumulated independently per
//! parent bucket. Missing values are excluded from bucketing.
//!
//! The engine reports buckets and metrics in structurally identical JSON;
//! [`result`] decodes them back into a tagged [`result::NestedBuckets`]
//! variant driven by the aggregation the caller actually requested, so no
//! unchecked downcast is ever needed.

pub mod result;
pub mod spec;

pub use result::{Bucket, NestedBuckets, decode_aggregations};
pub use spec::{NestedAggregation, TermsAggregation};
