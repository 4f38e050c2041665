//! In-memory reference transport.
//!
//! `MemoryTransport` is a small in-process engine that interprets the
//! JSON query DSL the core emits. It reproduces the visibility rules of
//! the real engine: `get_document` is realtime, while writes become
//! visible to `search` only after [`Transport::refresh`] (near-real-time
//! consistency). Analyzed text fields are tokenized with the named
//! analyzer at index time and additionally indexed whole under the
//! `.exact` sub-field.

use std::cmp::Ordering;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde_json::{Map, Value, json};

use crate::analysis::analyze;
use crate::error::{Result, SagittaError};
use crate::mapping::field::EXACT_SUFFIX;
use crate::mapping::{FieldSpec, IndexMapping};
use crate::query::wildcard::compile_wildcard;
use crate::transport::{EngineSearchRequest, RawHit, RawSearchResponse, Transport};

/// An in-memory engine implementing [`Transport`].
#[derive(Debug, Default)]
pub struct MemoryTransport {
    indices: RwLock<AHashMap<String, IndexState>>,
}

#[derive(Debug)]
struct IndexState {
    fields: Vec<FieldSpec>,
    seq: u64,
    /// Documents visible to search.
    visible: AHashMap<i64, IndexedDoc>,
    /// Unrefreshed writes. `Some` is a pending upsert, `None` a pending
    /// delete; the latest operation per identifier wins.
    staged: AHashMap<i64, Option<IndexedDoc>>,
}

#[derive(Debug, Clone)]
struct IndexedDoc {
    seq: u64,
    source: Value,
    /// Stored terms per field, including `.exact` sub-fields.
    terms: AHashMap<String, Vec<String>>,
}

impl MemoryTransport {
    /// Create an empty transport with no indices.
    pub fn new() -> Self {
        MemoryTransport::default()
    }
}

impl Transport for MemoryTransport {
    fn create_index(&self, mapping: &IndexMapping) -> Result<()> {
        let mut indices = self.indices.write();
        indices
            .entry(mapping.index_name().to_string())
            .or_insert_with(|| IndexState {
                fields: mapping.fields().to_vec(),
                seq: 0,
                visible: AHashMap::new(),
                staged: AHashMap::new(),
            });
        Ok(())
    }

    fn index_document(&self, index: &str, id: i64, source: Value) -> Result<()> {
        let mut indices = self.indices.write();
        let state = lookup_mut(&mut indices, index)?;
        state.seq += 1;
        let doc = IndexedDoc {
            seq: state.seq,
            terms: tokenize(&state.fields, &source),
            source,
        };
        state.staged.insert(id, Some(doc));
        Ok(())
    }

    fn get_document(&self, index: &str, id: i64) -> Result<Option<Value>> {
        let indices = self.indices.read();
        let state = lookup(&indices, index)?;
        if let Some(staged) = state.staged.get(&id) {
            return Ok(staged.as_ref().map(|doc| doc.source.clone()));
        }
        Ok(state.visible.get(&id).map(|doc| doc.source.clone()))
    }

    fn delete_document(&self, index: &str, id: i64) -> Result<()> {
        let mut indices = self.indices.write();
        let state = lookup_mut(&mut indices, index)?;
        state.staged.insert(id, None);
        Ok(())
    }

    fn search(&self, request: &EngineSearchRequest) -> Result<RawSearchResponse> {
        let indices = self.indices.read();
        let state = lookup(&indices, &request.index)?;

        let mut matches: Vec<(i64, &IndexedDoc)> = Vec::new();
        for (&id, doc) in &state.visible {
            if eval(&request.query, doc, state)? {
                matches.push((id, doc));
            }
        }
        sort_matches(&mut matches, &request.sort)?;

        let aggregations = execute_aggregations(&request.aggregations, &matches)?;

        let total_hits = matches.len() as u64;
        let hits = matches
            .into_iter()
            .skip(request.from)
            .take(request.size)
            .map(|(id, doc)| RawHit {
                id,
                source: project(&doc.source, &request.source_includes),
            })
            .collect();

        Ok(RawSearchResponse {
            total_hits,
            hits,
            aggregations,
        })
    }

    fn refresh(&self, index: &str) -> Result<()> {
        let mut indices = self.indices.write();
        let state = lookup_mut(&mut indices, index)?;
        for (id, op) in state.staged.drain() {
            match op {
                Some(doc) => {
                    state.visible.insert(id, doc);
                }
                None => {
                    state.visible.remove(&id);
                }
            }
        }
        Ok(())
    }
}

fn lookup<'a>(indices: &'a AHashMap<String, IndexState>, index: &str) -> Result<&'a IndexState> {
    indices
        .get(index)
        .ok_or_else(|| SagittaError::store_unavailable(format!("Index '{index}' does not exist")))
}

fn lookup_mut<'a>(
    indices: &'a mut AHashMap<String, IndexState>,
    index: &str,
) -> Result<&'a mut IndexState> {
    indices
        .get_mut(index)
        .ok_or_else(|| SagittaError::store_unavailable(format!("Index '{index}' does not exist")))
}

/// Build the stored terms of a document from the field declarations.
fn tokenize(fields: &[FieldSpec], source: &Value) -> AHashMap<String, Vec<String>> {
    let mut terms = AHashMap::new();
    for field in fields {
        let Some(value) = source.get(field.name()) else {
            continue;
        };
        let Some(raw) = value_term(value) else {
            continue;
        };
        if field.is_analyzed() {
            terms.insert(field.name().to_string(), analyze(field.analyzer(), &raw));
            terms.insert(field.exact_subfield(), vec![raw]);
        } else {
            terms.insert(field.name().to_string(), vec![raw]);
        }
    }
    terms
}

/// Literal term representation of a scalar source value.
fn value_term(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Raw source value of a field, resolving `.exact` references to the
/// base field.
fn raw_value<'a>(doc: &'a IndexedDoc, field: &str) -> Option<&'a Value> {
    let base = field.strip_suffix(EXACT_SUFFIX).unwrap_or(field);
    match doc.source.get(base) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}

fn bad_query<S: Into<String>>(msg: S) -> SagittaError {
    SagittaError::invalid_request(msg.into())
}

/// The single key/value entry of a DSL object.
fn single_entry(value: &Value) -> Result<(&String, &Value)> {
    value
        .as_object()
        .and_then(|obj| obj.iter().next())
        .ok_or_else(|| bad_query("Query clause must be a non-empty object"))
}

/// Evaluate a DSL query body against one document.
fn eval(query: &Value, doc: &IndexedDoc, state: &IndexState) -> Result<bool> {
    let (kind, body) = single_entry(query)?;
    match kind.as_str() {
        "match_all" => Ok(true),
        "term" => {
            let (field, inner) = single_entry(body)?;
            let value = inner
                .get("value")
                .ok_or_else(|| bad_query("Term query has no value"))?;
            Ok(has_term(doc, field, value))
        }
        "terms" => {
            let (field, values) = single_entry(body)?;
            let values = values
                .as_array()
                .ok_or_else(|| bad_query("Terms query requires a value array"))?;
            Ok(values.iter().any(|v| has_term(doc, field, v)))
        }
        "prefix" => {
            let (field, inner) = single_entry(body)?;
            let prefix = inner
                .get("value")
                .and_then(Value::as_str)
                .ok_or_else(|| bad_query("Prefix query has no value"))?;
            Ok(tokens(doc, field).iter().any(|t| t.starts_with(prefix)))
        }
        "wildcard" => {
            let (field, inner) = single_entry(body)?;
            let pattern = inner
                .get("value")
                .and_then(Value::as_str)
                .ok_or_else(|| bad_query("Wildcard query has no value"))?;
            let regex = compile_wildcard(pattern)?;
            Ok(tokens(doc, field).iter().any(|t| regex.is_match(t)))
        }
        "fuzzy" => {
            let (field, inner) = single_entry(body)?;
            let value = inner
                .get("value")
                .and_then(Value::as_str)
                .ok_or_else(|| bad_query("Fuzzy query has no value"))?;
            let max_edits = inner
                .get("fuzziness")
                .and_then(Value::as_u64)
                .unwrap_or(2)
                .min(2) as usize;
            Ok(tokens(doc, field)
                .iter()
                .any(|t| levenshtein(t, value) <= max_edits))
        }
        "range" => {
            let (field, bounds) = single_entry(body)?;
            eval_range(doc, field, bounds)
        }
        "bool" => eval_bool(body, doc, state),
        "multi_match" => eval_multi_match(body, doc, state),
        other => Err(bad_query(format!("Unsupported query kind '{other}'"))),
    }
}

fn tokens<'a>(doc: &'a IndexedDoc, field: &str) -> &'a [String] {
    doc.terms.get(field).map(Vec::as_slice).unwrap_or(&[])
}

fn has_term(doc: &IndexedDoc, field: &str, value: &Value) -> bool {
    match value_term(value) {
        Some(term) => tokens(doc, field).contains(&term),
        None => false,
    }
}

fn eval_range(doc: &IndexedDoc, field: &str, bounds: &Value) -> Result<bool> {
    let Some(actual) = raw_value(doc, field) else {
        return Ok(false);
    };
    let bounds = bounds
        .as_object()
        .ok_or_else(|| bad_query("Range query requires a bounds object"))?;

    for (bound, limit) in bounds {
        let ordering = compare_values(actual, limit);
        let ok = match bound.as_str() {
            "gte" => ordering != Ordering::Less,
            "gt" => ordering == Ordering::Greater,
            "lte" => ordering != Ordering::Greater,
            "lt" => ordering == Ordering::Less,
            other => return Err(bad_query(format!("Unsupported range bound '{other}'"))),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_bool(body: &Value, doc: &IndexedDoc, state: &IndexState) -> Result<bool> {
    let clauses = |name: &str| -> Result<Vec<&Value>> {
        match body.get(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.iter().collect()),
            Some(_) => Err(bad_query(format!("Bool clause '{name}' must be an array"))),
        }
    };

    let must = clauses("must")?;
    let must_not = clauses("must_not")?;
    let should = clauses("should")?;
    let filter = clauses("filter")?;

    for &clause in must.iter().chain(&filter) {
        if !eval(clause, doc, state)? {
            return Ok(false);
        }
    }
    for &clause in &must_not {
        if eval(clause, doc, state)? {
            return Ok(false);
        }
    }
    // Should clauses are required only when no must/filter clauses exist;
    // otherwise they would merely boost the score.
    if must.is_empty() && filter.is_empty() && !should.is_empty() {
        for &clause in &should {
            if eval(clause, doc, state)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    Ok(true)
}

fn eval_multi_match(body: &Value, doc: &IndexedDoc, state: &IndexState) -> Result<bool> {
    let query = body
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_query("MultiMatch query has no query string"))?;
    let fields = body
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| bad_query("MultiMatch query has no field list"))?;

    for field in fields {
        let field = field
            .as_str()
            .ok_or_else(|| bad_query("MultiMatch field names must be strings"))?;
        // Analyze the query string with the field's own rule: analyzed
        // text fields tokenize it, keyword fields and .exact sub-fields
        // treat it as one term.
        let query_terms = match field_spec(state, field) {
            Some(spec) if spec.is_analyzed() && !field.ends_with(EXACT_SUFFIX) => {
                analyze(spec.analyzer(), query)
            }
            _ => vec![query.to_string()],
        };
        let stored = tokens(doc, field);
        if query_terms.iter().any(|t| stored.contains(t)) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn field_spec<'a>(state: &'a IndexState, field: &str) -> Option<&'a FieldSpec> {
    let base = field.strip_suffix(EXACT_SUFFIX).unwrap_or(field);
    state.fields.iter().find(|f| f.name() == base)
}

/// Compare two scalar values, numerically when both sides are numeric
/// (numeric strings included), lexicographically otherwise.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_term(a)
            .unwrap_or_default()
            .cmp(&value_term(b).unwrap_or_default()),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn sort_matches(matches: &mut [(i64, &IndexedDoc)], sort: &[Value]) -> Result<()> {
    if sort.is_empty() {
        // Engine default ordering: indexing sequence.
        matches.sort_by_key(|(_, doc)| doc.seq);
        return Ok(());
    }

    let mut clauses = Vec::with_capacity(sort.len());
    for clause in sort {
        let (field, inner) = single_entry(clause)?;
        let descending = matches!(inner.get("order").and_then(Value::as_str), Some("desc"));
        clauses.push((field.clone(), descending));
    }

    matches.sort_by(|x, y| {
        let (a, b) = (x.1, y.1);
        for (field, descending) in &clauses {
            let ordering = match (raw_value(a, field), raw_value(b, field)) {
                (None, None) => Ordering::Equal,
                // Missing values sort last regardless of direction.
                (None, Some(_)) => return Ordering::Greater,
                (Some(_), None) => return Ordering::Less,
                (Some(x), Some(y)) => {
                    let ordering = compare_values(x, y);
                    if *descending { ordering.reverse() } else { ordering }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.seq.cmp(&b.seq)
    });
    Ok(())
}

/// Execute terms aggregations (with at most one nested level) over the
/// full match set, before pagination.
fn execute_aggregations(
    aggregations: &Map<String, Value>,
    matches: &[(i64, &IndexedDoc)],
) -> Result<Map<String, Value>> {
    let mut results = Map::new();
    for (name, body) in aggregations {
        let terms = body
            .get("terms")
            .ok_or_else(|| bad_query(format!("Aggregation '{name}' is not a terms aggregation")))?;
        let nested = body.get("aggs");
        results.insert(name.clone(), execute_terms(terms, nested, matches)?);
    }
    Ok(results)
}

fn execute_terms(
    terms: &Value,
    nested: Option<&Value>,
    matches: &[(i64, &IndexedDoc)],
) -> Result<Value> {
    let field = terms
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_query("Terms aggregation has no field"))?;
    let size = terms
        .get("size")
        .and_then(Value::as_u64)
        .ok_or_else(|| bad_query("Terms aggregation has no size"))? as usize;

    // Group by distinct field value; documents without a value for the
    // field fall into no bucket.
    let mut groups: Vec<(Value, Vec<(i64, &IndexedDoc)>)> = Vec::new();
    for &(id, doc) in matches {
        let Some(key) = raw_value(doc, field) else {
            continue;
        };
        match groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, docs)) => docs.push((id, doc)),
            None => groups.push((key.clone(), vec![(id, doc)])),
        }
    }

    // Descending document count, ties broken by ascending key.
    groups.sort_by(|(ka, da), (kb, db)| {
        db.len()
            .cmp(&da.len())
            .then_with(|| compare_values(ka, kb))
    });
    groups.truncate(size);

    let mut buckets = Vec::with_capacity(groups.len());
    for (key, docs) in groups {
        let mut bucket = Map::new();
        bucket.insert("key".to_string(), key);
        bucket.insert("doc_count".to_string(), json!(docs.len()));
        if let Some(nested) = nested {
            let (child_name, child_body) = single_entry(nested)?;
            bucket.insert(child_name.clone(), execute_nested(child_body, &docs)?);
        }
        buckets.push(Value::Object(bucket));
    }
    Ok(json!({ "buckets": buckets }))
}

fn execute_nested(body: &Value, docs: &[(i64, &IndexedDoc)]) -> Result<Value> {
    if let Some(avg) = body.get("avg") {
        let field = avg
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| bad_query("Avg aggregation has no field"))?;
        let values: Vec<f64> = docs
            .iter()
            .filter_map(|&(_, doc)| raw_value(doc, field).and_then(numeric))
            .collect();
        let value = if values.is_empty() {
            Value::Null
        } else {
            json!(values.iter().sum::<f64>() / values.len() as f64)
        };
        return Ok(json!({ "value": value }));
    }
    if let Some(terms) = body.get("terms") {
        // One nesting level only; a nested terms aggregation cannot
        // itself carry children.
        return execute_terms(terms, None, docs);
    }
    Err(bad_query("Unsupported nested aggregation kind"))
}

/// Minimum number of single-character edits between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Apply the source-include projection to a document source.
fn project(source: &Value, includes: &[String]) -> Value {
    if includes.is_empty() {
        return source.clone();
    }
    let Some(object) = source.as_object() else {
        return source.clone();
    };
    let projected: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| includes.iter().any(|inc| inc == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(projected)
}
