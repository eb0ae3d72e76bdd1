//! Route definitions for Snipes domain API

use axum::{routing::post, Router};

use super::handlers::analyze;
use super::middleware::SnipesState;

/// Create all Snipes domain API routes
pub fn routes() -> Router<SnipesState> {
    Router::new().route("/analyze", post(analyze::analyze))
}
