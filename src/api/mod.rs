//! HTTP API
//!
//! Thin routing layer over the relationship services. Path parameters are
//! external ids; handlers resolve them to typed entities before anything
//! reaches a service.

pub mod routes;

pub use routes::{create_router, AppState};
