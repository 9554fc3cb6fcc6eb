//! following-service Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod domain;
pub mod events;
pub mod service;
pub mod store;

// Private modules (used only by the server binary)
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::{Store, StoreError};
