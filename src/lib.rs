//! Sagitta is a typed document-repository library over a distributed
//! text-search engine.
//!
//! It layers a small number of concerns on top of a wire transport:
//!
//! - **Mapping**: [`mapping::IndexMapping`] declares an index's fields,
//!   analyzers, and shard topology, and validates every field reference
//!   before it reaches the engine.
//! - **Queries**: [`query::Predicate`] is a validated predicate tree
//!   (term, terms, multi-match, prefix, wildcard, fuzzy, range, bool)
//!   encoded losslessly into the engine's JSON DSL by [`query::dsl`].
//! - **Requests**: [`query::SearchRequest`] bundles a predicate with
//!   pagination, sorting, source projection, and aggregations.
//! - **Aggregations**: [`aggregation::TermsAggregation`] buckets matches
//!   by field value, with one optional nested terms or average metric.
//! - **Repositories**: [`repository::EngineRepository`] is the typed CRUD
//!   and search surface over an [`entity::Entity`], behind the
//!   [`transport::Transport`] seam.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde::{Deserialize, Serialize};
//! use sagitta::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Product {
//!     id: i64,
//!     name: String,
//!     count: i64,
//!     price: f64,
//! }
//!
//! impl Entity for Product {
//!     fn id(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! fn main() -> sagitta::error::Result<()> {
//!     let mapping = IndexMapping::builder("ec")
//!         .shards(5)
//!         .replicas(0)
//!         .field(FieldSpec::text("name").with_analyzer("standard"))
//!         .field(FieldSpec::keyword("count"))
//!         .field(FieldSpec::keyword("price"))
//!         .build()?;
//!
//!     let transport = Arc::new(MemoryTransport::new());
//!     transport.create_index(&mapping)?;
//!
//!     let repository = EngineRepository::new(transport.clone(), mapping.clone());
//!     repository.save(Product {
//!         id: 100001,
//!         name: "手机".to_string(),
//!         count: 5,
//!         price: 1999.45,
//!     })?;
//!     transport.refresh("ec")?;
//!
//!     let request = SearchRequest::builder()
//!         .predicate(Predicate::term(&mapping, "count", 5)?)
//!         .sort(Sort::desc("price"))
//!         .build()?;
//!     let results: SearchResults<Product> = repository.search(&request)?;
//!     assert_eq!(results.total_hits, 1);
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod analysis;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod query;
pub mod repository;
pub mod transport;

/// Version of the sagitta library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used types and traits.
pub mod prelude {
    pub use crate::aggregation::{Bucket, NestedBuckets, TermsAggregation};
    pub use crate::entity::Entity;
    pub use crate::error::{Result, SagittaError};
    pub use crate::mapping::{FieldKind, FieldSpec, IndexMapping};
    pub use crate::query::{
        Predicate, SearchRequest, Sort, SortOrder,
    };
    pub use crate::repository::{EngineRepository, Repository, SearchResults};
    pub use crate::transport::{MemoryTransport, Transport};
}
