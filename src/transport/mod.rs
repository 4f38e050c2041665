//! The transport seam between the core and the search engine.
//!
//! Everything remote hides behind the [`Transport`] trait: the core hands
//! it engine-native requests (the JSON query DSL produced by
//! [`crate::query::dsl`]) and receives raw documents and aggregation
//! bodies back. Timeouts, retries, and connection pooling are the
//! transport's business; the core surfaces success or a typed failure and
//! never retries.
//!
//! [`memory::MemoryTransport`] is the reference implementation, an
//! in-process engine that interprets the DSL with the same visibility
//! rules as the real one (realtime get, near-real-time search).

pub mod memory;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::mapping::IndexMapping;

pub use memory::MemoryTransport;

/// An engine-native search request.
#[derive(Debug, Clone)]
pub struct EngineSearchRequest {
    /// The target index.
    pub index: String,
    /// The query body, in the engine's JSON DSL.
    pub query: Value,
    /// Offset of the first hit to return.
    pub from: usize,
    /// Maximum number of hits to return.
    pub size: usize,
    /// Sort clauses, in priority order.
    pub sort: Vec<Value>,
    /// Source-field projection allow-list. Empty means all fields.
    pub source_includes: Vec<String>,
    /// Aggregation bodies keyed by aggregation name.
    pub aggregations: Map<String, Value>,
}

/// One raw hit of a search response.
#[derive(Debug, Clone)]
pub struct RawHit {
    /// The document identifier.
    pub id: i64,
    /// The (possibly projected) document source.
    pub source: Value,
}

/// The raw engine response to a search request.
#[derive(Debug, Clone)]
pub struct RawSearchResponse {
    /// Total number of documents matching the query, across all pages.
    pub total_hits: u64,
    /// The requested page of hits.
    pub hits: Vec<RawHit>,
    /// Raw aggregation results keyed by aggregation name.
    pub aggregations: Map<String, Value>,
}

/// The wire transport to the search engine.
///
/// All operations are synchronous request/response calls and may be
/// invoked concurrently. A transport handle is constructed once and
/// shared by reference into repositories.
pub trait Transport: Send + Sync {
    /// Provision an index from a mapping: index name, shard and replica
    /// counts, and per-field analyzer names are handed over here, at
    /// index-creation time. Idempotent.
    fn create_index(&self, mapping: &IndexMapping) -> Result<()>;

    /// Upsert a document source under the given identifier. Full replace:
    /// fields absent from the new source are cleared, not merged.
    fn index_document(&self, index: &str, id: i64, source: Value) -> Result<()>;

    /// Fetch a document source by identifier. Realtime: sees writes that
    /// are not yet visible to search.
    fn get_document(&self, index: &str, id: i64) -> Result<Option<Value>>;

    /// Delete a document by identifier. Deleting an absent identifier is
    /// not an error.
    fn delete_document(&self, index: &str, id: i64) -> Result<()>;

    /// Execute a search request.
    fn search(&self, request: &EngineSearchRequest) -> Result<RawSearchResponse>;

    /// Make writes issued before this call visible to search.
    fn refresh(&self, index: &str) -> Result<()>;
}
