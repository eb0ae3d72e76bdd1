//! Identity of an authenticated caller

use crate::claims::IdTokenClaims;

/// Represents an authenticated user context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Provider user ID (`sub` claim)
    pub uid: String,
    pub email: Option<String>,
}

impl From<IdTokenClaims> for AuthContext {
    fn from(claims: IdTokenClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
        }
    }
}
