//! # Filter Translation
//!
//! Rewrites the filter part of a query spec into the engine's
//! native filter document. Comparison tokens used as nested keys gain the
//! engine's operator escape, so `{ price: { gte: "500" } }` turns into
//! `{ price: { $gte: 500 } }`.

use serde_json::{json, Map, Number, Value};

use super::spec::{QuerySpec, QueryValue};

/// Engine-native filter: field name to scalar or operator object
pub type FilterDocument = Map<String, Value>;

/// Marker the engine expects in front of operator keys
pub const OPERATOR_ESCAPE: char = '$';

/// Comparison tokens accepted in a query spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonToken {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonToken {
    /// Recognize an unescaped token
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(ComparisonToken::Gt),
            "gte" => Some(ComparisonToken::Gte),
            "lt" => Some(ComparisonToken::Lt),
            "lte" => Some(ComparisonToken::Lte),
            _ => None,
        }
    }

    /// The engine form of the token
    pub fn escaped(&self) -> &'static str {
        match self {
            ComparisonToken::Gt => "$gt",
            ComparisonToken::Gte => "$gte",
            ComparisonToken::Lt => "$lt",
            ComparisonToken::Lte => "$lte",
        }
    }
}

/// Escape a nested key if it is a comparison token.
///
/// Keys that already carry the escape, and keys that are not tokens, are
/// returned unchanged.
pub fn escape_operator(key: &str) -> String {
    match ComparisonToken::parse(key) {
        Some(token) => token.escaped().to_string(),
        None => key.to_string(),
    }
}

/// Build the engine filter for every non-reserved entry of the query spec
pub fn build_filter(spec: &QuerySpec) -> FilterDocument {
    spec.filter_entries()
        .map(|(field, value)| (field.clone(), translate_value(value)))
        .collect()
}

fn translate_value(value: &QueryValue) -> Value {
    match value {
        QueryValue::Text(text) => parse_literal(text),
        QueryValue::List(items) => {
            let items: Vec<Value> = items.iter().map(|item| parse_literal(item)).collect();
            json!({ "$in": items })
        }
        QueryValue::Nested(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| (escape_operator(key), translate_value(inner)))
                .collect(),
        ),
    }
}

/// Infer a typed literal from query-string text.
///
/// Text becomes a number only when it is that number's canonical form, so
/// `007`, `+5` or `7.50` stay strings. The engine compares such strings
/// numerically against numeric fields.
pub fn parse_literal(value: &str) -> Value {
    match value {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = value.parse::<i64>() {
        if n.to_string() == value {
            return Value::Number(n.into());
        }
    }
    if let Some(num) = value.parse::<f64>().ok().and_then(Number::from_f64) {
        if num.to_string() == value {
            return Value::Number(num);
        }
    }

    Value::String(value.to_string())
}
