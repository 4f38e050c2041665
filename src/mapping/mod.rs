//! Index mapping definition for typed entities.
//!
//! A mapping declares an entity's index identity (index name, shard and
//! replica counts) and the indexing behavior of each field. It is the
//! local source of truth that predicates and aggregations are validated
//! against before anything is sent to the engine.

pub mod field;
#[allow(clippy::module_inception)]
pub mod mapping;

pub use field::{FieldKind, FieldSpec};
pub use mapping::{IndexMapping, MappingBuilder};
