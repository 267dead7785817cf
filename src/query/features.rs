//! # Query Features
//!
//! Translates a [`QuerySpec`] into a [`DocumentQuery`] in four steps:
//! filter, sort, field limiting and pagination. Each step consumes the
//! builder and returns a new one, so a half-built translation cannot be
//! reused by accident; clone it to branch explicitly.
//!
//! ```ignore
//! let query = QueryFeatures::new(DocumentQuery::new(), &spec, &defaults)
//!     .filter()
//!     .sort()
//!     .limit_fields()
//!     .paginate()
//!     .into_query();
//! ```

use serde::{Deserialize, Serialize};

use super::document_query::DocumentQuery;
use super::filter::build_filter;
use super::pagination::Pagination;
use super::projection::Projection;
use super::sort::SortSpec;
use super::spec::QuerySpec;

/// Internal version field dropped from documents unless asked for
pub const VERSION_FIELD: &str = "__v";

/// Defaults applied when a query spec leaves a step unspecified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    /// Page used when `page` is missing or invalid
    pub default_page: u64,

    /// Page size used when `limit` is missing or invalid
    pub default_limit: u64,

    /// Ordering used when `sort` is missing
    pub default_sort: SortSpec,

    /// Fields excluded when `fields` is missing
    pub default_projection_exclusions: Vec<String>,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_limit: 100,
            default_sort: SortSpec::parse("-createdAt"),
            default_projection_exclusions: vec![VERSION_FIELD.to_string()],
        }
    }
}

impl QueryDefaults {
    /// Reject defaults that can never produce a usable query
    pub fn validate(&self) -> Result<(), String> {
        if self.default_page == 0 {
            return Err("default_page must be > 0".to_string());
        }
        if self.default_limit == 0 {
            return Err("default_limit must be > 0".to_string());
        }
        if self.default_sort.is_empty() {
            return Err("default_sort must name at least one field".to_string());
        }
        Ok(())
    }
}

/// Step-wise translator from a query spec to a document query
#[derive(Debug, Clone)]
pub struct QueryFeatures<'a> {
    query: DocumentQuery,
    spec: &'a QuerySpec,
    defaults: &'a QueryDefaults,
}

impl<'a> QueryFeatures<'a> {
    pub fn new(query: DocumentQuery, spec: &'a QuerySpec, defaults: &'a QueryDefaults) -> Self {
        Self {
            query,
            spec,
            defaults,
        }
    }

    /// Apply every non-reserved entry as a field predicate
    pub fn filter(self) -> Self {
        let filter = build_filter(self.spec);
        self.layer(|query| query.find(filter))
    }

    /// Order by `sort`, or by the default ordering
    pub fn sort(self) -> Self {
        let sort = match self.spec.text("sort") {
            Some(text) => SortSpec::parse(text),
            None => self.defaults.default_sort.clone(),
        };
        self.layer(|query| query.sort(sort))
    }

    /// Project onto `fields`, or drop the default exclusions
    pub fn limit_fields(self) -> Self {
        let projection = match self.spec.text("fields") {
            Some(text) => Projection::parse(text),
            None => Projection::exclude(self.defaults.default_projection_exclusions.iter().cloned()),
        };
        self.layer(|query| query.select(projection))
    }

    /// Skip to `page` and cap at `limit`
    pub fn paginate(self) -> Self {
        let pagination = Pagination::from_spec(
            self.spec,
            self.defaults.default_page,
            self.defaults.default_limit,
        );
        self.layer(|query| query.skip(pagination.skip()).limit(pagination.limit))
    }

    /// All four steps in the conventional order
    pub fn apply_all(self) -> Self {
        self.filter().sort().limit_fields().paginate()
    }

    pub fn query(&self) -> &DocumentQuery {
        &self.query
    }

    pub fn into_query(self) -> DocumentQuery {
        self.query
    }

    fn layer(self, step: impl FnOnce(DocumentQuery) -> DocumentQuery) -> Self {
        Self {
            query: step(self.query),
            spec: self.spec,
            defaults: self.defaults,
        }
    }
}
