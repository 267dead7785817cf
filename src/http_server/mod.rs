//! # HTTP Server Module
//!
//! axum server exposing the record handlers.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/v1/tours`, `/api/v1/tours/:id` - Tours
//! - `/api/v1/tours/:id/reviews` - Reviews of one tour
//! - `/api/v1/reviews`, `/api/v1/reviews/:id` - Reviews
//! - `/api/v1/users`, `/api/v1/users/:id` - Users

pub mod config;
pub mod routes;
pub mod server;

pub use config::HttpServerConfig;
pub use server::HttpServer;
