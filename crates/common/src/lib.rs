//! Shared utilities, configuration, and error handling for Snipr
//!
//! This crate provides common functionality used across the Snipr backend:
//! - Configuration management following 12-factor principles
//! - Error types and their JSON response shape
//! - Request extractors

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;

pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
