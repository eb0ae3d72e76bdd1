//! Authentication middleware for the Snipr API
//!
//! Verifies bearer ID tokens issued by the identity provider and exposes an
//! axum extractor that works with any state implementing `FromRef<S>` for
//! `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;

pub use backend::AuthBackend;
pub use claims::IdTokenClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::AuthUser;
