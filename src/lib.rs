//! tourdesk - a tour catalogue API
//!
//! Translates URL query parameters into document queries and serves
//! generic CRUD handlers for tours, reviews and users over an in-memory
//! document store.

pub mod app;
pub mod cli;
pub mod collection;
pub mod handler;
pub mod http_server;
pub mod models;
pub mod observability;
pub mod query;
