//! ID token claims

use serde::{Deserialize, Serialize};

/// Claims carried by an identity-provider ID token
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject (provider user ID)
    pub sub: String,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
}
