//! Observability for the service
//!
//! Structured one-line JSON logs plus scopes that time a unit of work.
//! Logging is synchronous and never fails the caller.
//!
//! ```ignore
//! use tourdesk::observability::{Logger, ObservationScope};
//!
//! Logger::info("SERVER_STARTED", &[("addr", "127.0.0.1:3000")]);
//!
//! let scope = ObservationScope::new("SEED");
//! // ... do work ...
//! scope.complete();
//! ```

mod logger;
mod scope;

pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};
