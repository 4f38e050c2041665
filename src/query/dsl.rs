//! Lossless serialization of predicate and aggregation trees into the
//! engine's JSON query DSL.
//!
//! This is the core's only contract with the transport collaborator: the
//! structures produced here round-trip through the engine with no loss of
//! meaning, and responses decode back with no loss of bucket nesting.

use serde_json::{Map, Value, json};

use crate::aggregation::{NestedAggregation, TermsAggregation};
use crate::query::predicate::{Predicate, RangeBound};
use crate::query::request::{Sort, SortOrder};

/// Encode a predicate tree into the engine query DSL.
pub fn encode_predicate(predicate: &Predicate) -> Value {
    match predicate {
        Predicate::Term { field, value } => json!({
            "term": { field: { "value": value } }
        }),
        Predicate::Terms { field, values } => json!({
            "terms": { field: values }
        }),
        Predicate::MultiMatch { query, fields } => json!({
            "multi_match": {
                "query": query,
                "fields": fields,
                "type": "best_fields",
            }
        }),
        Predicate::Prefix { field, prefix } => json!({
            "prefix": { field: { "value": prefix } }
        }),
        Predicate::Wildcard { field, pattern } => json!({
            "wildcard": { field: { "value": pattern } }
        }),
        Predicate::Fuzzy {
            field,
            value,
            max_edits,
        } => json!({
            "fuzzy": { field: { "value": value, "fuzziness": max_edits } }
        }),
        Predicate::Range {
            field,
            lower,
            upper,
        } => {
            let mut bounds = Map::new();
            if let Some(RangeBound { value, inclusive }) = lower {
                bounds.insert(
                    if *inclusive { "gte" } else { "gt" }.to_string(),
                    value.clone(),
                );
            }
            if let Some(RangeBound { value, inclusive }) = upper {
                bounds.insert(
                    if *inclusive { "lte" } else { "lt" }.to_string(),
                    value.clone(),
                );
            }
            json!({ "range": { field: bounds } })
        }
        Predicate::Bool {
            must,
            must_not,
            should,
            filter,
        } => {
            let mut body = Map::new();
            for (key, clauses) in [
                ("must", must),
                ("must_not", must_not),
                ("should", should),
                ("filter", filter),
            ] {
                if !clauses.is_empty() {
                    body.insert(
                        key.to_string(),
                        Value::Array(clauses.iter().map(encode_predicate).collect()),
                    );
                }
            }
            json!({ "bool": body })
        }
    }
}

/// The query body for a request without a predicate.
pub fn match_all() -> Value {
    json!({ "match_all": {} })
}

/// Encode sort clauses in priority order.
pub fn encode_sort(sort: &[Sort]) -> Vec<Value> {
    sort.iter()
        .map(|s| {
            let field = s.field.as_str();
            let order = match s.order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            json!({ field: { "order": order } })
        })
        .collect()
}

/// Encode aggregation specs into the engine's aggregation body map.
pub fn encode_aggregations(aggregations: &[TermsAggregation]) -> Map<String, Value> {
    let mut body = Map::new();
    for agg in aggregations {
        let mut entry = Map::new();
        entry.insert(
            "terms".to_string(),
            json!({ "field": agg.field(), "size": agg.size() }),
        );
        if let Some(nested) = agg.nested() {
            let child = match nested {
                NestedAggregation::Avg { field, .. } => json!({ "avg": { "field": field } }),
                NestedAggregation::Terms { field, size, .. } => {
                    json!({ "terms": { "field": field, "size": size } })
                }
            };
            let name = nested.name();
            entry.insert("aggs".to_string(), json!({ name: child }));
        }
        body.insert(agg.name().to_string(), Value::Object(entry));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldSpec, IndexMapping};

    fn mapping() -> IndexMapping {
        IndexMapping::builder("product")
            .field(FieldSpec::text("name").with_analyzer("standard"))
            .field(FieldSpec::keyword("count"))
            .field(FieldSpec::keyword("price"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_encode_term() {
        let mapping = mapping();
        let predicate = Predicate::term(&mapping, "name.exact", "电视").unwrap();

        assert_eq!(
            encode_predicate(&predicate),
            json!({"term": {"name.exact": {"value": "电视"}}})
        );
    }

    #[test]
    fn test_encode_terms() {
        let mapping = mapping();
        let predicate = Predicate::terms(&mapping, "name", vec!["苹", "果"]).unwrap();

        assert_eq!(
            encode_predicate(&predicate),
            json!({"terms": {"name": ["苹", "果"]}})
        );
    }

    #[test]
    fn test_encode_multi_match() {
        let mapping = mapping();
        let predicate = Predicate::multi_match(&mapping, "39", &["name", "count"]).unwrap();

        assert_eq!(
            encode_predicate(&predicate),
            json!({"multi_match": {"query": "39", "fields": ["name", "count"], "type": "best_fields"}})
        );
    }

    #[test]
    fn test_encode_fuzzy() {
        let mapping = mapping();
        let predicate = Predicate::fuzzy(&mapping, "name", "苹查查果", 2).unwrap();

        assert_eq!(
            encode_predicate(&predicate),
            json!({"fuzzy": {"name": {"value": "苹查查果", "fuzziness": 2}}})
        );
    }

    #[test]
    fn test_encode_range_bounds() {
        let mapping = mapping();
        let predicate = Predicate::range(&mapping, "count")
            .unwrap()
            .gt(10)
            .lte(30)
            .build()
            .unwrap();

        assert_eq!(
            encode_predicate(&predicate),
            json!({"range": {"count": {"gt": 10, "lte": 30}}})
        );

        let half_open = Predicate::range(&mapping, "count")
            .unwrap()
            .gte(10)
            .build()
            .unwrap();
        assert_eq!(
            encode_predicate(&half_open),
            json!({"range": {"count": {"gte": 10}}})
        );
    }

    #[test]
    fn test_encode_bool_skips_empty_clause_lists() {
        let mapping = mapping();
        let predicate = Predicate::bool()
            .must(Predicate::range(&mapping, "count").unwrap().gt(10).build().unwrap())
            .must_not(Predicate::term(&mapping, "count", 34).unwrap())
            .build()
            .unwrap();

        assert_eq!(
            encode_predicate(&predicate),
            json!({"bool": {
                "must": [{"range": {"count": {"gt": 10}}}],
                "must_not": [{"term": {"count": {"value": 34}}}],
            }})
        );
    }

    #[test]
    fn test_encode_sort() {
        let clauses = encode_sort(&[Sort::desc("count"), Sort::asc("price")]);

        assert_eq!(
            clauses,
            vec![
                json!({"count": {"order": "desc"}}),
                json!({"price": {"order": "asc"}}),
            ]
        );
    }

    #[test]
    fn test_encode_aggregations() {
        let mapping = mapping();
        let aggs = vec![
            TermsAggregation::new(&mapping, "counts", "count", 30).unwrap(),
            TermsAggregation::new(&mapping, "count_price", "count", 30)
                .unwrap()
                .with_avg(&mapping, "price_avg", "price")
                .unwrap(),
        ];

        let body = encode_aggregations(&aggs);
        assert_eq!(
            body["counts"],
            json!({"terms": {"field": "count", "size": 30}})
        );
        assert_eq!(
            body["count_price"],
            json!({
                "terms": {"field": "count", "size": 30},
                "aggs": {"price_avg": {"avg": {"field": "price"}}},
            })
        );
    }
}
