//! API layer for the Snipes domain
//!
//! Contains HTTP handlers, routes, and domain state definition.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::SnipesState;
pub use routes::routes;
