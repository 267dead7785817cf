//! Stored documents as handed out by a collection.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use crate::query::projection::ID_FIELD;
pub use crate::query::VERSION_FIELD;

/// One document of a collection, keyed by its `id` field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    document: Map<String, Value>,
}

impl Record {
    pub fn from_document(document: Map<String, Value>) -> Self {
        Self { document }
    }

    /// The record id; absent only when a projection dropped it
    pub fn id(&self) -> Option<&str> {
        self.document.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Look up a field, following dots into embedded documents
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.document, path)
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn into_document(self) -> Map<String, Value> {
        self.document
    }

    /// Deserialize into a typed document
    pub fn to_model<M: DeserializeOwned>(&self) -> Result<M, serde_json::Error> {
        serde_json::from_value(Value::Object(self.document.clone()))
    }
}

/// Resolve a dotted path such as `startLocation.address`
pub fn lookup_path<'a>(document: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}
