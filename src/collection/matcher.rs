//! # Filter Matching
//!
//! Compiles an engine filter document into predicates and evaluates them
//! against stored documents. All predicates of a filter are ANDed.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::errors::{CollectionError, CollectionResult};
use super::record::lookup_path;
use crate::query::filter::{FilterDocument, OPERATOR_ESCAPE};
use crate::query::{SortDirection, SortSpec};

/// Operators the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOperator {
    /// Parse an escaped operator key such as `$gte`
    pub fn from_escaped(key: &str) -> Option<Self> {
        match key.strip_prefix(OPERATOR_ESCAPE)? {
            "eq" => Some(FilterOperator::Eq),
            "ne" => Some(FilterOperator::Ne),
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            "in" => Some(FilterOperator::In),
            _ => None,
        }
    }
}

/// A single field predicate
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Check if a document matches this predicate
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        let field_value = lookup_path(doc, &self.field);

        match self.operator {
            FilterOperator::Eq => equals(field_value, &self.value),
            FilterOperator::Ne => !equals(field_value, &self.value),
            FilterOperator::Gt => compares(field_value, &self.value, |o| o == Ordering::Greater),
            FilterOperator::Gte => compares(field_value, &self.value, |o| o != Ordering::Less),
            FilterOperator::Lt => compares(field_value, &self.value, |o| o == Ordering::Less),
            FilterOperator::Lte => compares(field_value, &self.value, |o| o != Ordering::Greater),
            FilterOperator::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| equals(field_value, c))),
        }
    }
}

/// Predicates combined with AND
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub filters: Vec<FilterExpr>,
}

impl FilterSet {
    /// Compile a filter document, rejecting anything the engine cannot run
    pub fn compile(filter: &FilterDocument) -> CollectionResult<Self> {
        let mut filters = Vec::new();

        for (field, condition) in filter {
            if field.starts_with(OPERATOR_ESCAPE) {
                return Err(CollectionError::malformed(format!(
                    "unsupported top-level operator '{}'",
                    field
                )));
            }

            match condition {
                Value::Object(ops) if ops.keys().any(|k| k.starts_with(OPERATOR_ESCAPE)) => {
                    if let Some(plain) = ops.keys().find(|k| !k.starts_with(OPERATOR_ESCAPE)) {
                        return Err(CollectionError::malformed(format!(
                            "'{}' mixes operators with the plain key '{}'",
                            field, plain
                        )));
                    }

                    for (key, operand) in ops {
                        let operator = FilterOperator::from_escaped(key).ok_or_else(|| {
                            CollectionError::malformed(format!(
                                "unknown operator '{}' on '{}'",
                                key, field
                            ))
                        })?;
                        check_operand(field, operator, operand)?;
                        filters.push(FilterExpr::new(field.clone(), operator, operand.clone()));
                    }
                }
                other => filters.push(FilterExpr::new(field.clone(), FilterOperator::Eq, other.clone())),
            }
        }

        Ok(Self { filters })
    }

    /// Check if a document matches all filters
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }
}

fn check_operand(field: &str, operator: FilterOperator, operand: &Value) -> CollectionResult<()> {
    let ok = match operator {
        FilterOperator::In => operand.is_array(),
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            !(operand.is_object() || operand.is_array())
        }
        FilterOperator::Eq | FilterOperator::Ne => true,
    };

    if ok {
        Ok(())
    } else {
        Err(CollectionError::malformed(format!(
            "invalid operand {} for '{}'",
            operand, field
        )))
    }
}

/// Equality with array membership: a list field matches when any element does
fn equals(field_value: Option<&Value>, expected: &Value) -> bool {
    match field_value {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| scalar_equals(item, expected))
        }
        Some(actual) => scalar_equals(actual, expected),
    }
}

/// Equality that casts the query literal to the stored kind. Stored text
/// matches the literal's text form; a stored number matches numeric text.
fn scalar_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(text), Value::Number(n)) => *text == n.to_string(),
        (Value::Number(n), Value::String(text)) => {
            numeric_text(text).is_some_and(|value| Some(value) == n.as_f64())
        }
        (Value::String(text), Value::Bool(b)) => text == if *b { "true" } else { "false" },
        (Value::String(text), Value::Null) => text == "null",
        _ => actual == expected,
    }
}

/// Finite number written as text, e.g. `007` or `+5`
fn numeric_text(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn compares(field_value: Option<&Value>, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match field_value {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| compare_scalars(item, operand).is_some_and(&accept)),
        Some(actual) => compare_scalars(actual, operand).is_some_and(accept),
        None => false,
    }
}

/// Order two values of the same kind; mismatched kinds do not compare
fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&numeric_text(b)?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Rank of a value's kind when sorting mixed kinds
fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = kind_rank(a).cmp(&kind_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Some(a), Some(b)) => compare_scalars(a, b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Stable multi-key sort; missing fields sort first when ascending
pub fn sort_documents(documents: &mut [Map<String, Value>], sort: &SortSpec) {
    if sort.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        for key in sort.keys() {
            let cmp = compare_for_sort(lookup_path(a, &key.field), lookup_path(b, &key.field));
            let cmp = match key.direction {
                SortDirection::Ascending => cmp,
                SortDirection::Descending => cmp.reverse(),
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn filter(value: Value) -> FilterDocument {
        doc(value)
    }

    #[test]
    fn test_eq_filter() {
        let set = FilterSet::compile(&filter(json!({ "difficulty": "easy" }))).unwrap();

        assert!(set.matches(&doc(json!({ "difficulty": "easy" }))));
        assert!(!set.matches(&doc(json!({ "difficulty": "medium" }))));
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        let set = FilterSet::compile(&filter(json!({ "price": 397 }))).unwrap();

        assert!(set.matches(&doc(json!({ "price": 397.0 }))));
    }

    #[test]
    fn test_number_matches_numeric_text() {
        let set = FilterSet::compile(&filter(json!({ "code": 42 }))).unwrap();

        assert!(set.matches(&doc(json!({ "code": "42" }))));
    }

    #[test]
    fn test_text_literals_match_stored_text() {
        let set = FilterSet::compile(&filter(json!({ "name": "007" }))).unwrap();
        assert!(set.matches(&doc(json!({ "name": "007" }))));
        assert!(!set.matches(&doc(json!({ "name": "7" }))));

        let set = FilterSet::compile(&filter(json!({ "name": 7 }))).unwrap();
        assert!(set.matches(&doc(json!({ "name": "7" }))));
        assert!(!set.matches(&doc(json!({ "name": "007" }))));

        let set = FilterSet::compile(&filter(json!({ "name": true }))).unwrap();
        assert!(set.matches(&doc(json!({ "name": "true" }))));
        assert!(set.matches(&doc(json!({ "name": true }))));
        assert!(!set.matches(&doc(json!({ "name": "false" }))));
    }

    #[test]
    fn test_numeric_text_matches_number_field() {
        let set = FilterSet::compile(&filter(json!({ "price": "0397" }))).unwrap();
        assert!(set.matches(&doc(json!({ "price": 397 }))));

        let set = FilterSet::compile(&filter(json!({ "price": { "$gte": "+500" } }))).unwrap();
        assert!(set.matches(&doc(json!({ "price": 997 }))));
        assert!(!set.matches(&doc(json!({ "price": 397 }))));
    }

    #[test]
    fn test_range_filters() {
        let set = FilterSet::compile(&filter(json!({ "price": { "$gte": 500, "$lt": 1000 } }))).unwrap();

        assert!(set.matches(&doc(json!({ "price": 500 }))));
        assert!(set.matches(&doc(json!({ "price": 997 }))));
        assert!(!set.matches(&doc(json!({ "price": 1000 }))));
        assert!(!set.matches(&doc(json!({ "price": 497 }))));
        assert!(!set.matches(&doc(json!({ "name": "no price" }))));
    }

    #[test]
    fn test_ne_matches_missing_field() {
        let set = FilterSet::compile(&filter(json!({ "secretTour": { "$ne": true } }))).unwrap();

        assert!(set.matches(&doc(json!({ "name": "a" }))));
        assert!(set.matches(&doc(json!({ "secretTour": false }))));
        assert!(!set.matches(&doc(json!({ "secretTour": true }))));
    }

    #[test]
    fn test_in_filter() {
        let set = FilterSet::compile(&filter(json!({ "difficulty": { "$in": ["easy", "medium"] } }))).unwrap();

        assert!(set.matches(&doc(json!({ "difficulty": "easy" }))));
        assert!(!set.matches(&doc(json!({ "difficulty": "difficult" }))));
    }

    #[test]
    fn test_array_field_membership() {
        let set = FilterSet::compile(&filter(json!({ "guides": "u1" }))).unwrap();

        assert!(set.matches(&doc(json!({ "guides": ["u0", "u1"] }))));
        assert!(!set.matches(&doc(json!({ "guides": ["u2"] }))));
    }

    #[test]
    fn test_dotted_path() {
        let set = FilterSet::compile(&filter(json!({ "startLocation.address": "Miami, USA" }))).unwrap();

        assert!(set.matches(&doc(json!({ "startLocation": { "address": "Miami, USA" } }))));
    }

    #[test]
    fn test_unknown_operator_is_malformed() {
        let err = FilterSet::compile(&filter(json!({ "price": { "$regex": "x" } }))).unwrap_err();
        assert!(matches!(err, CollectionError::MalformedQuery(_)));
    }

    #[test]
    fn test_mixed_operator_object_is_malformed() {
        let err = FilterSet::compile(&filter(json!({ "price": { "$gte": 1, "foo": 2 } }))).unwrap_err();
        assert!(matches!(err, CollectionError::MalformedQuery(_)));
    }

    #[test]
    fn test_non_scalar_operand_is_malformed() {
        let err = FilterSet::compile(&filter(json!({ "price": { "$gte": { "$in": [1, 2] } } }))).unwrap_err();
        assert!(matches!(err, CollectionError::MalformedQuery(_)));
    }

    #[test]
    fn test_top_level_operator_is_malformed() {
        let err = FilterSet::compile(&filter(json!({ "$or": [] }))).unwrap_err();
        assert!(matches!(err, CollectionError::MalformedQuery(_)));
    }

    #[test]
    fn test_plain_object_is_embedded_equality() {
        let set = FilterSet::compile(&filter(json!({ "startLocation": { "type": "Point" } }))).unwrap();

        assert!(set.matches(&doc(json!({ "startLocation": { "type": "Point" } }))));
        assert!(!set.matches(&doc(json!({ "startLocation": { "type": "Point", "address": "x" } }))));
    }

    #[test]
    fn test_sort_price_then_rating_desc() {
        let mut docs = vec![
            doc(json!({ "id": "a", "price": 500, "ratingsAverage": 4.1 })),
            doc(json!({ "id": "b", "price": 397, "ratingsAverage": 4.8 })),
            doc(json!({ "id": "c", "price": 500, "ratingsAverage": 4.9 })),
        ];

        sort_documents(&mut docs, &SortSpec::parse("price,-ratingsAverage"));

        let ids: Vec<&str> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_missing_first_ascending() {
        let mut docs = vec![
            doc(json!({ "id": "a", "price": 5 })),
            doc(json!({ "id": "b" })),
        ];

        sort_documents(&mut docs, &SortSpec::parse("price"));
        assert_eq!(docs[0]["id"], "b");

        sort_documents(&mut docs, &SortSpec::parse("-price"));
        assert_eq!(docs[0]["id"], "a");
    }
}
