//! # Record Handlers
//!
//! Generic create/read/update/delete operations over any [`Collection`],
//! returning enveloped replies or typed [`AppError`]s.
//!
//! [`Collection`]: crate::collection::Collection

pub mod errors;
pub mod factory;
pub mod response;

pub use errors::{AppError, AppResult, ErrorResponse};
pub use factory::{ListContext, RecordHandler};
pub use response::{DataBody, Envelope, Reply, ResponseStatus};
