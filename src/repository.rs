//! The public CRUD and search surface over a typed entity.
//!
//! [`Repository`] is a single-capability trait parameterized over the
//! entity type; [`EngineRepository`] implements it once for every entity
//! kind on top of a shared [`Transport`] handle. It translates search
//! requests into engine calls and decodes the heterogeneous response
//! (paged hits, bucketed aggregations) back into typed results.
//!
//! Consistency caveats: a `save` becomes visible to `search` only after
//! the engine's refresh interval (`find_by_id` is realtime), and
//! `save_all` carries no atomicity guarantee across the batch.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::aggregation::{Bucket, decode_aggregations};
use crate::entity::Entity;
use crate::error::{Result, SagittaError};
use crate::mapping::IndexMapping;
use crate::query::dsl;
use crate::query::{Predicate, SearchRequest};
use crate::transport::{EngineSearchRequest, Transport};

/// Page size used by the finder helpers, which return every match
/// rather than a page.
const FINDER_PAGE_SIZE: usize = 10_000;

/// A typed search result page.
#[derive(Debug)]
pub struct SearchResults<E> {
    /// The decoded entities of the requested page.
    pub hits: Vec<E>,
    /// Total number of matching documents across all pages.
    pub total_hits: u64,
    /// Decoded aggregation buckets keyed by aggregation name.
    pub aggregations: HashMap<String, Vec<Bucket>>,
}

/// CRUD and search over one entity kind.
pub trait Repository<E: Entity> {
    /// Upsert an entity by identifier and echo it back.
    ///
    /// Full replace semantics: fields absent from the new instance are
    /// cleared, not merged.
    fn save(&self, entity: E) -> Result<E>;

    /// Batch upsert. Stops at the first failure and reports it; entities
    /// saved before the failure stay saved (no atomicity across the
    /// batch).
    fn save_all(&self, entities: Vec<E>) -> Result<()>;

    /// Fetch an entity by identifier. Realtime; fails with
    /// [`SagittaError::NotFound`] on a miss.
    fn find_by_id(&self, id: i64) -> Result<E>;

    /// Find every entity whose field exactly matches a term. Field values
    /// are not guaranteed unique, so this always returns a sequence.
    fn find_by_field<V: Into<Value>>(&self, field: &str, value: V) -> Result<Vec<E>>;

    /// Find every entity whose field lies in the inclusive range
    /// `[min, max]`.
    fn find_by_range<V: Into<Value>>(&self, field: &str, min: V, max: V) -> Result<Vec<E>>;

    /// Delete an entity by identifier. Deleting an absent identifier is
    /// not an error.
    fn delete_by_id(&self, id: i64) -> Result<()>;

    /// Execute a search request: predicate, pagination, sort, projection,
    /// and aggregations.
    fn search(&self, request: &SearchRequest) -> Result<SearchResults<E>>;
}

/// The [`Repository`] implementation backed by an engine transport.
pub struct EngineRepository<E> {
    transport: Arc<dyn Transport>,
    mapping: IndexMapping,
    _entity: PhantomData<fn() -> E>,
}

impl<E> std::fmt::Debug for EngineRepository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRepository")
            .field("index", &self.mapping.index_name())
            .finish()
    }
}

impl<E: Entity> EngineRepository<E> {
    /// Create a repository over a shared transport handle and the
    /// entity's index mapping.
    pub fn new(transport: Arc<dyn Transport>, mapping: IndexMapping) -> Self {
        EngineRepository {
            transport,
            mapping,
            _entity: PhantomData,
        }
    }

    /// The index mapping this repository validates against.
    pub fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    /// Serialize an entity to its document source, checking that every
    /// serialized field is declared before anything goes on the wire.
    fn to_source(&self, entity: &E) -> Result<Value> {
        let source = serde_json::to_value(entity)?;
        let Some(object) = source.as_object() else {
            return Err(SagittaError::decode(
                "Entity must serialize to a JSON object",
            ));
        };
        for field in object.keys() {
            if field != "id" && !self.mapping.has_field(field) {
                return Err(SagittaError::unknown_field(field));
            }
        }
        Ok(source)
    }

    fn decode_hit(&self, id: i64, source: Value) -> Result<E> {
        serde_json::from_value(source)
            .map_err(|e| SagittaError::decode(format!("Document {id} does not decode: {e}")))
    }

    /// Run a predicate and collect every matching entity.
    fn find_all(&self, predicate: Predicate) -> Result<Vec<E>> {
        let request = SearchRequest::builder()
            .predicate(predicate)
            .page_size(FINDER_PAGE_SIZE)
            .build()?;
        Ok(self.search(&request)?.hits)
    }
}

impl<E: Entity> Repository<E> for EngineRepository<E> {
    fn save(&self, entity: E) -> Result<E> {
        let source = self.to_source(&entity)?;
        self.transport
            .index_document(self.mapping.index_name(), entity.id(), source)?;
        Ok(entity)
    }

    fn save_all(&self, entities: Vec<E>) -> Result<()> {
        for entity in entities {
            self.save(entity)?;
        }
        Ok(())
    }

    fn find_by_id(&self, id: i64) -> Result<E> {
        match self.transport.get_document(self.mapping.index_name(), id)? {
            Some(source) => self.decode_hit(id, source),
            None => Err(SagittaError::not_found(format!(
                "No document with id {id} in index '{}'",
                self.mapping.index_name()
            ))),
        }
    }

    fn find_by_field<V: Into<Value>>(&self, field: &str, value: V) -> Result<Vec<E>> {
        self.find_all(Predicate::term(&self.mapping, field, value)?)
    }

    fn find_by_range<V: Into<Value>>(&self, field: &str, min: V, max: V) -> Result<Vec<E>> {
        self.find_all(
            Predicate::range(&self.mapping, field)?
                .gte(min)
                .lte(max)
                .build()?,
        )
    }

    fn delete_by_id(&self, id: i64) -> Result<()> {
        self.transport
            .delete_document(self.mapping.index_name(), id)
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResults<E>> {
        let engine_request = EngineSearchRequest {
            index: self.mapping.index_name().to_string(),
            query: request
                .predicate()
                .map(dsl::encode_predicate)
                .unwrap_or_else(dsl::match_all),
            from: request.page() * request.page_size(),
            size: request.page_size(),
            sort: dsl::encode_sort(request.sort()),
            source_includes: request.source_fields().to_vec(),
            aggregations: dsl::encode_aggregations(request.aggregations()),
        };

        let response = self.transport.search(&engine_request)?;

        let mut hits = Vec::with_capacity(response.hits.len());
        for hit in response.hits {
            hits.push(self.decode_hit(hit.id, hit.source)?);
        }
        let aggregations = decode_aggregations(request.aggregations(), &response.aggregations)?;

        Ok(SearchResults {
            hits,
            total_hits: response.total_hits,
            aggregations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldSpec;
    use crate::transport::MemoryTransport;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Product {
        id: i64,
        name: String,
        count: i64,
        price: f64,
    }

    impl Entity for Product {
        fn id(&self) -> i64 {
            self.id
        }
    }

    fn mapping() -> IndexMapping {
        IndexMapping::builder("product")
            .shards(5)
            .replicas(0)
            .field(FieldSpec::text("name").with_analyzer("standard"))
            .field(FieldSpec::keyword("count"))
            .field(FieldSpec::keyword("price"))
            .build()
            .unwrap()
    }

    fn repository() -> (Arc<MemoryTransport>, EngineRepository<Product>) {
        let transport = Arc::new(MemoryTransport::new());
        transport.create_index(&mapping()).unwrap();
        let repository = EngineRepository::new(transport.clone(), mapping());
        (transport, repository)
    }

    fn product(id: i64, name: &str, count: i64, price: f64) -> Product {
        Product {
            id,
            name: name.to_string(),
            count,
            price,
        }
    }

    #[test]
    fn test_save_and_find_by_id() {
        let (_, repository) = repository();

        let saved = repository.save(product(100001, "手机", 5, 1999.45)).unwrap();
        assert_eq!(saved.id(), 100001);

        // Get-by-id is realtime; no refresh needed.
        let found = repository.find_by_id(100001).unwrap();
        assert_eq!(found, saved);
    }

    #[test]
    fn test_find_by_id_miss_is_not_found() {
        let (_, repository) = repository();
        assert!(matches!(
            repository.find_by_id(42),
            Err(SagittaError::NotFound(_))
        ));
    }

    #[test]
    fn test_resave_fully_replaces() {
        let (transport, repository) = repository();

        repository.save(product(1, "手机", 5, 1999.45)).unwrap();
        repository.save(product(1, "手机", 5, 2000.45)).unwrap();

        let found = repository.find_by_id(1).unwrap();
        assert_eq!(found.price, 2000.45);

        // A source with fewer fields replaces, never merges.
        transport
            .index_document("product", 1, json!({"id": 1, "name": "手机"}))
            .unwrap();
        let source = transport.get_document("product", 1).unwrap().unwrap();
        assert!(source.get("price").is_none());
    }

    #[test]
    fn test_save_rejects_undeclared_fields() {
        #[derive(Debug, Serialize, Deserialize)]
        struct Rogue {
            id: i64,
            colour: String,
        }
        impl Entity for Rogue {
            fn id(&self) -> i64 {
                self.id
            }
        }

        let transport = Arc::new(MemoryTransport::new());
        transport.create_index(&mapping()).unwrap();
        let repository: EngineRepository<Rogue> =
            EngineRepository::new(transport, mapping());

        let result = repository.save(Rogue {
            id: 1,
            colour: "red".to_string(),
        });
        assert!(matches!(result, Err(SagittaError::UnknownField(_))));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_, repository) = repository();

        repository.save(product(1, "手机", 5, 1999.45)).unwrap();
        repository.delete_by_id(1).unwrap();
        repository.delete_by_id(1).unwrap();

        assert!(matches!(
            repository.find_by_id(1),
            Err(SagittaError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_by_field_returns_every_match() {
        let (transport, repository) = repository();

        repository
            .save_all(vec![
                product(1, "苹果", 5, 10.0),
                product(2, "苹果", 9, 20.0),
                product(3, "电视", 9, 30.0),
            ])
            .unwrap();
        transport.refresh("product").unwrap();

        let found = repository.find_by_field("name.exact", "苹果").unwrap();
        assert_eq!(found.len(), 2);

        let found = repository.find_by_field("count", 9).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_find_by_range_is_inclusive() {
        let (transport, repository) = repository();

        repository
            .save_all(vec![
                product(1, "a", 10, 1500.1),
                product(2, "b", 20, 1500.5),
                product(3, "c", 30, 1500.9),
            ])
            .unwrap();
        transport.refresh("product").unwrap();

        let found = repository.find_by_range("price", 1500.1, 1500.5).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_search_decodes_aggregations() {
        use crate::aggregation::{NestedBuckets, TermsAggregation};

        let (transport, repository) = repository();
        repository
            .save_all(vec![
                product(1, "a", 5, 10.0),
                product(2, "b", 5, 20.0),
                product(3, "c", 9, 40.0),
            ])
            .unwrap();
        transport.refresh("product").unwrap();

        let mapping = mapping();
        let request = SearchRequest::builder()
            .aggregation(
                TermsAggregation::new(&mapping, "count_price", "count", 10)
                    .unwrap()
                    .with_avg(&mapping, "price_avg", "price")
                    .unwrap(),
            )
            .build()
            .unwrap();

        let results = repository.search(&request).unwrap();
        assert_eq!(results.total_hits, 3);

        let buckets = &results.aggregations["count_price"];
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key_as_i64(), Some(5));
        match buckets[0].nested.as_ref().unwrap() {
            NestedBuckets::Avg { value, .. } => assert_eq!(*value, Some(15.0)),
            other => panic!("Expected Avg, got {other:?}"),
        }
    }

    #[test]
    fn test_transport_failure_surfaces_as_store_unavailable() {
        // No create_index: every operation hits a missing index.
        let transport = Arc::new(MemoryTransport::new());
        let repository: EngineRepository<Product> =
            EngineRepository::new(transport, mapping());

        assert!(matches!(
            repository.save(product(1, "手机", 5, 1999.45)),
            Err(SagittaError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_save_all_stops_at_first_failure() {
        #[derive(Debug, Serialize, Deserialize)]
        #[serde(untagged)]
        enum Mixed {
            Good { id: i64, count: i64 },
            Bad { id: i64, colour: String },
        }
        impl Entity for Mixed {
            fn id(&self) -> i64 {
                match self {
                    Mixed::Good { id, .. } | Mixed::Bad { id, .. } => *id,
                }
            }
        }

        let transport = Arc::new(MemoryTransport::new());
        transport.create_index(&mapping()).unwrap();
        let repository: EngineRepository<Mixed> =
            EngineRepository::new(transport.clone(), mapping());

        let result = repository.save_all(vec![
            Mixed::Good { id: 1, count: 5 },
            Mixed::Bad {
                id: 2,
                colour: "red".to_string(),
            },
            Mixed::Good { id: 3, count: 7 },
        ]);
        assert!(matches!(result, Err(SagittaError::UnknownField(_))));

        // The entity before the failure was saved; the one after was not.
        assert!(transport.get_document("product", 1).unwrap().is_some());
        assert!(transport.get_document("product", 3).unwrap().is_none());
    }
}
