//! # Query Translation
//!
//! Turns a request's query spec into a [`DocumentQuery`] the
//! collection layer can execute.

pub mod document_query;
pub mod features;
pub mod filter;
pub mod pagination;
pub mod projection;
pub mod sort;
pub mod spec;

pub use document_query::DocumentQuery;
pub use features::{QueryDefaults, QueryFeatures, VERSION_FIELD};
pub use filter::{build_filter, FilterDocument};
pub use pagination::Pagination;
pub use projection::{Projection, ProjectionMode};
pub use sort::{SortDirection, SortKey, SortSpec};
pub use spec::{QuerySpec, QueryValue};
