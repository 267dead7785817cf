//! # Query Spec
//!
//! The raw key/value mapping a request hands to the query translator.
//! Keys such as `price[gte]` are folded into nested values, and repeated
//! keys collect into lists, so `?price[gte]=500&difficulty=easy` becomes
//! `{ price: { gte: "500" }, difficulty: "easy" }`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keys that steer pagination, sorting and projection instead of filtering
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Returns true for keys that never become filter predicates
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// A single value in a query spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// `key=value`
    Text(String),

    /// `key=a&key=b`
    List(Vec<String>),

    /// `key[op]=value`
    Nested(BTreeMap<String, QueryValue>),
}

impl QueryValue {
    /// The scalar text carried by this value.
    ///
    /// Lists yield their last entry, matching how duplicated meta keys
    /// (`sort=price&sort=-price`) are resolved. Nested values have no text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            QueryValue::Text(text) => Some(text),
            QueryValue::List(items) => items.last().map(String::as_str),
            QueryValue::Nested(_) => None,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Text(existing) => {
                let first = std::mem::take(existing);
                *self = QueryValue::List(vec![first, value]);
            }
            QueryValue::List(items) => items.push(value),
            QueryValue::Nested(_) => *self = QueryValue::Text(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

/// Request-supplied query spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuerySpec {
    entries: BTreeMap<String, QueryValue>,
}

fn bracket_key() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^\[\]]+)\[([^\[\]]+)\]$").expect("bracket key pattern is valid")
    })
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query spec from decoded query-string pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut spec = QuerySpec::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();

            match bracket_key().captures(key) {
                Some(caps) => {
                    let field = caps[1].to_string();
                    let operator = caps[2].to_string();

                    let slot = spec
                        .entries
                        .entry(field)
                        .or_insert_with(|| QueryValue::Nested(BTreeMap::new()));

                    if !matches!(slot, QueryValue::Nested(_)) {
                        *slot = QueryValue::Nested(BTreeMap::new());
                    }

                    if let QueryValue::Nested(map) = slot {
                        match map.get_mut(&operator) {
                            Some(existing) => existing.push(value),
                            None => {
                                map.insert(operator, QueryValue::Text(value));
                            }
                        }
                    }
                }
                None => match spec.entries.get_mut(key) {
                    Some(existing) => existing.push(value),
                    None => {
                        spec.entries.insert(key.to_string(), QueryValue::Text(value));
                    }
                },
            }
        }

        spec
    }

    /// Add an entry, replacing any previous value for the key
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.get(key)
    }

    /// Non-empty text of a key. Empty values count as absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(QueryValue::as_text)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryValue)> {
        self.entries.iter()
    }

    /// Entries that describe field predicates
    pub fn filter_entries(&self) -> impl Iterator<Item = (&String, &QueryValue)> {
        self.entries.iter().filter(|(key, _)| !is_reserved(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
