//! # Document Query
//!
//! The abstract query a collection executes. It is an owned value: every
//! builder method consumes the query and hands back the refined one.

use serde::Serialize;
use serde_json::Value;

use super::filter::FilterDocument;
use super::projection::Projection;
use super::sort::SortSpec;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentQuery {
    filter: FilterDocument,

    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<SortSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    projection: Option<Projection>,

    skip: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    populate: Vec<String>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge conditions into the filter. A field that is already
    /// constrained takes the new condition.
    pub fn find(mut self, filter: FilterDocument) -> Self {
        for (field, condition) in filter {
            self.filter.insert(field, condition);
        }
        self
    }

    /// Constrain a single field
    pub fn where_field(mut self, field: impl Into<String>, condition: Value) -> Self {
        self.filter.insert(field.into(), condition);
        self
    }

    /// Replace the ordering
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Replace the projection
    pub fn select(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Expand a relation in every returned document
    pub fn populate(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.populate.contains(&path) {
            self.populate.push(path);
        }
        self
    }

    pub fn filter_document(&self) -> &FilterDocument {
        &self.filter
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn offset(&self) -> u64 {
        self.skip
    }

    pub fn page_size(&self) -> Option<u64> {
        self.limit
    }

    pub fn populate_paths(&self) -> &[String] {
        &self.populate
    }
}
