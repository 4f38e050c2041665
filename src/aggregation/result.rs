//! Decoding of raw engine aggregation responses into typed buckets.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::aggregation::spec::{NestedAggregation, TermsAggregation};
use crate::error::{Result, SagittaError};

/// One bucket of a terms aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// The distinct field value shared by the bucket's documents.
    pub key: Value,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Decoded nested aggregation results, if one was requested.
    pub nested: Option<NestedBuckets>,
}

/// Typed nested aggregation results under a parent bucket.
///
/// The engine's response is structurally identical JSON either way; the
/// variant is chosen from the aggregation the caller requested, so
/// consumers match on this enum instead of downcasting.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedBuckets {
    /// Second-level terms buckets.
    Terms { name: String, buckets: Vec<Bucket> },
    /// Average of a numeric field. `None` when the bucket held no values
    /// for the averaged field.
    Avg { name: String, value: Option<f64> },
}

impl Bucket {
    /// The bucket key as a string, if it is one.
    pub fn key_as_str(&self) -> Option<&str> {
        self.key.as_str()
    }

    /// The bucket key as a signed integer, if it is one.
    pub fn key_as_i64(&self) -> Option<i64> {
        self.key.as_i64()
    }

    /// The bucket key as a float, if it is numeric.
    pub fn key_as_f64(&self) -> Option<f64> {
        self.key.as_f64()
    }
}

/// Decode the raw aggregation section of an engine response into a map
/// from aggregation name to bucket list, driven by the requested specs.
///
/// Fails with [`SagittaError::DecodeError`] when the response shape does
/// not match what was requested.
pub fn decode_aggregations(
    specs: &[TermsAggregation],
    raw: &Map<String, Value>,
) -> Result<HashMap<String, Vec<Bucket>>> {
    let mut decoded = HashMap::with_capacity(specs.len());
    for spec in specs {
        let body = raw.get(spec.name()).ok_or_else(|| {
            SagittaError::decode(format!(
                "Aggregation '{}' missing from engine response",
                spec.name()
            ))
        })?;
        let buckets = decode_terms(spec.name(), body, spec.nested())?;
        decoded.insert(spec.name().to_string(), buckets);
    }
    Ok(decoded)
}

fn decode_terms(name: &str, body: &Value, nested: Option<&NestedAggregation>) -> Result<Vec<Bucket>> {
    let raw_buckets = body
        .get("buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            SagittaError::decode(format!("Aggregation '{name}' has no bucket array"))
        })?;

    let mut buckets = Vec::with_capacity(raw_buckets.len());
    for raw_bucket in raw_buckets {
        buckets.push(decode_bucket(name, raw_bucket, nested)?);
    }
    Ok(buckets)
}

fn decode_bucket(
    name: &str,
    raw: &Value,
    nested: Option<&NestedAggregation>,
) -> Result<Bucket> {
    let key = raw
        .get("key")
        .cloned()
        .ok_or_else(|| SagittaError::decode(format!("Bucket of '{name}' has no key")))?;
    let doc_count = raw
        .get("doc_count")
        .and_then(Value::as_u64)
        .ok_or_else(|| SagittaError::decode(format!("Bucket of '{name}' has no doc_count")))?;

    let nested = match nested {
        None => None,
        Some(NestedAggregation::Avg { name: child, .. }) => {
            let body = raw.get(child.as_str()).ok_or_else(|| {
                SagittaError::decode(format!("Nested aggregation '{child}' missing from bucket"))
            })?;
            let value = match body.get("value") {
                Some(Value::Null) => None,
                Some(v) => Some(v.as_f64().ok_or_else(|| {
                    SagittaError::decode(format!("Nested avg '{child}' is not numeric"))
                })?),
                None => {
                    return Err(SagittaError::decode(format!(
                        "Nested avg '{child}' has no value"
                    )));
                }
            };
            Some(NestedBuckets::Avg {
                name: child.clone(),
                value,
            })
        }
        Some(NestedAggregation::Terms { name: child, .. }) => {
            let body = raw.get(child.as_str()).ok_or_else(|| {
                SagittaError::decode(format!("Nested aggregation '{child}' missing from bucket"))
            })?;
            // The nested level cannot itself nest.
            let buckets = decode_terms(child, body, None)?;
            Some(NestedBuckets::Terms {
                name: child.clone(),
                buckets,
            })
        }
    };

    Ok(Bucket {
        key,
        doc_count,
        nested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldSpec, IndexMapping};
    use serde_json::json;

    fn mapping() -> IndexMapping {
        IndexMapping::builder("product")
            .field(FieldSpec::keyword("count"))
            .field(FieldSpec::keyword("price"))
            .build()
            .unwrap()
    }

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected object"),
        }
    }

    #[test]
    fn test_decode_plain_terms() {
        let mapping = mapping();
        let specs = vec![TermsAggregation::new(&mapping, "counts", "count", 2).unwrap()];
        let raw = raw(json!({
            "counts": {
                "buckets": [
                    {"key": 5, "doc_count": 3},
                    {"key": 9, "doc_count": 2},
                ]
            }
        }));

        let decoded = decode_aggregations(&specs, &raw).unwrap();
        let buckets = &decoded["counts"];
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key_as_i64(), Some(5));
        assert_eq!(buckets[0].doc_count, 3);
        assert!(buckets[0].nested.is_none());
    }

    #[test]
    fn test_decode_nested_avg() {
        let mapping = mapping();
        let specs = vec![
            TermsAggregation::new(&mapping, "count_price", "count", 10)
                .unwrap()
                .with_avg(&mapping, "price_avg", "price")
                .unwrap(),
        ];
        let raw = raw(json!({
            "count_price": {
                "buckets": [
                    {"key": 5, "doc_count": 2, "price_avg": {"value": 15.0}},
                    {"key": 9, "doc_count": 1, "price_avg": {"value": null}},
                ]
            }
        }));

        let decoded = decode_aggregations(&specs, &raw).unwrap();
        let buckets = &decoded["count_price"];
        match buckets[0].nested.as_ref().unwrap() {
            NestedBuckets::Avg { name, value } => {
                assert_eq!(name, "price_avg");
                assert_eq!(*value, Some(15.0));
            }
            other => panic!("Expected Avg, got {other:?}"),
        }
        match buckets[1].nested.as_ref().unwrap() {
            NestedBuckets::Avg { value, .. } => assert_eq!(*value, None),
            other => panic!("Expected Avg, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_nested_terms() {
        let mapping = mapping();
        let specs = vec![
            TermsAggregation::new(&mapping, "counts", "count", 10)
                .unwrap()
                .with_terms(&mapping, "prices", "price", 5)
                .unwrap(),
        ];
        let raw = raw(json!({
            "counts": {
                "buckets": [
                    {"key": 5, "doc_count": 2, "prices": {"buckets": [
                        {"key": 10.0, "doc_count": 1},
                        {"key": 20.0, "doc_count": 1},
                    ]}},
                ]
            }
        }));

        let decoded = decode_aggregations(&specs, &raw).unwrap();
        match decoded["counts"][0].nested.as_ref().unwrap() {
            NestedBuckets::Terms { buckets, .. } => {
                assert_eq!(buckets.len(), 2);
                assert_eq!(buckets[0].key_as_f64(), Some(10.0));
            }
            other => panic!("Expected Terms, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_mismatch_is_a_decode_error() {
        let mapping = mapping();
        let specs = vec![TermsAggregation::new(&mapping, "counts", "count", 2).unwrap()];

        let missing = raw(json!({}));
        assert!(matches!(
            decode_aggregations(&specs, &missing),
            Err(SagittaError::DecodeError(_))
        ));

        let no_buckets = raw(json!({"counts": {"value": 3.0}}));
        assert!(matches!(
            decode_aggregations(&specs, &no_buckets),
            Err(SagittaError::DecodeError(_))
        ));
    }
}
