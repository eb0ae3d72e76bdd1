//! Snipes domain state and auth backend integration

use axum::extract::FromRef;
use snipr_auth::AuthBackend;

use crate::domain::analyzer::SnipeAnalyzer;
use crate::SnipesRepositories;

/// Application state for the Snipes domain
#[derive(Clone)]
pub struct SnipesState {
    pub repos: SnipesRepositories,
    pub auth: AuthBackend,
    pub analyzer: SnipeAnalyzer,
}

impl FromRef<SnipesState> for AuthBackend {
    fn from_ref(state: &SnipesState) -> Self {
        state.auth.clone()
    }
}
