//! # Document Types
//!
//! A [`Model`] describes one collection: how its documents deserialize,
//! which rules they must satisfy, and how every query against them is
//! scoped. Handlers and collections are generic over it, so the schema is
//! fixed at compile time.

pub mod review;
pub mod tour;
pub mod user;
pub mod validation;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::query::DocumentQuery;

pub use review::Review;
pub use tour::{Difficulty, GeoPoint, Tour};
pub use user::{Role, User};
pub use validation::{FieldError, ValidationErrors};

/// Schema capability of a document type
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name, also the name relations use to find it
    const COLLECTION: &'static str;

    /// Field referencing the parent document in nested listings
    const PARENT_FIELD: Option<&'static str> = None;

    /// Fields omitted unless a projection names them
    const HIDDEN_FIELDS: &'static [&'static str] = &[];

    /// Fields whose values must be unique across the collection
    const UNIQUE_FIELDS: &'static [&'static str] = &[];

    /// Check every rule the document must satisfy
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Canonicalize field values; runs on every write
    fn normalize(&mut self) {}

    /// Derive fields on first write
    fn before_insert(&mut self) {}

    /// Conditions and expansions applied to every query on the collection
    fn scope_query(query: DocumentQuery) -> DocumentQuery {
        query
    }

    /// Relations that can be expanded with `populate`
    fn relations() -> Vec<Relation> {
        Vec::new()
    }

    /// Fields derived from a stored document whenever it is read. They are
    /// never stored and are subject to projection like stored fields.
    fn computed_fields(_document: &Map<String, Value>) -> Map<String, Value> {
        Map::new()
    }
}

/// A field that can be replaced by documents from another collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Field name in this collection's documents
    pub path: &'static str,

    /// Collection holding the related documents
    pub target: &'static str,

    pub kind: RelationKind,

    /// Projection applied to related documents, e.g. `name,photo`
    pub select: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The field stores one id or a list of ids of target documents
    Reference,

    /// Target documents store this document's id in `foreign_field`
    Virtual { foreign_field: &'static str },
}

impl Relation {
    pub fn reference(path: &'static str, target: &'static str, select: &'static str) -> Self {
        Self {
            path,
            target,
            kind: RelationKind::Reference,
            select,
        }
    }

    pub fn virtual_list(
        path: &'static str,
        target: &'static str,
        foreign_field: &'static str,
        select: &'static str,
    ) -> Self {
        Self {
            path,
            target,
            kind: RelationKind::Virtual { foreign_field },
            select,
        }
    }
}

/// Serde helpers for timestamps stored with a fixed millisecond format,
/// so they order correctly as text
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
