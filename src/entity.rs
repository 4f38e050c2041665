//! Typed entities persisted through a repository.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A record that can be persisted to, and retrieved from, an index.
///
/// Entities round-trip through JSON: the serialized form is the document
/// source sent to the engine, and hits decode back with `serde`. The
/// identifier is the document's primary key; uniqueness is enforced by
/// the store, not locally.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// The unique identifier of this entity.
    fn id(&self) -> i64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Product {
        id: i64,
        name: String,
    }

    impl Entity for Product {
        fn id(&self) -> i64 {
            self.id
        }
    }

    #[test]
    fn test_entity_round_trips_through_json() {
        let product = Product {
            id: 100001,
            name: "手机".to_string(),
        };

        let source = serde_json::to_value(&product).unwrap();
        assert_eq!(source["id"], 100001);

        let decoded: Product = serde_json::from_value(source).unwrap();
        assert_eq!(decoded, product);
        assert_eq!(decoded.id(), 100001);
    }
}
