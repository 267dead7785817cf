//! # Collections
//!
//! Typed, asynchronous access to a set of documents. Handlers depend only
//! on the [`Collection`] trait; [`MemoryCollection`] is the engine the
//! server ships with.

pub mod errors;
pub mod matcher;
pub mod memory;
pub mod record;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::models::Model;
use crate::query::{DocumentQuery, FilterDocument};

pub use errors::{CollectionError, CollectionResult};
pub use matcher::{FilterExpr, FilterOperator, FilterSet};
pub use memory::{MemoryCollection, MemoryDatabase};
pub use record::Record;

/// A queryable, writable set of documents of one [`Model`]
///
/// Lookups by id yield `None` for documents that do not exist or that the
/// model's query scope hides.
pub trait Collection: Send + Sync + 'static {
    type Model: Model;

    /// Start a query against this collection
    fn find(&self, filter: FilterDocument) -> DocumentQuery {
        DocumentQuery::new().find(filter)
    }

    /// Execute a query and return the matching page of records
    fn exec(&self, query: DocumentQuery) -> BoxFuture<'_, CollectionResult<Vec<Record>>>;

    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
        populate: &'a [String],
    ) -> BoxFuture<'a, CollectionResult<Option<Record>>>;

    /// Validate and store a new document
    fn insert(&self, payload: Map<String, Value>) -> BoxFuture<'_, CollectionResult<Record>>;

    /// Merge `patch` into a stored document and revalidate it
    fn update_by_id<'a>(
        &'a self,
        id: &'a str,
        patch: Map<String, Value>,
    ) -> BoxFuture<'a, CollectionResult<Option<Record>>>;

    fn delete_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CollectionResult<Option<Record>>>;
}
