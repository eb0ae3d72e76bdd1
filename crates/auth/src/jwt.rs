//! JWT validation and token extraction helpers

use axum::http::HeaderValue;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::claims::IdTokenClaims;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Validate an ID token signed with the shared secret
pub(crate) fn validate_jwt_token(
    token: &str,
    config: &AuthConfig,
) -> Result<IdTokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);

    if let Some(aud) = &config.audience {
        validation.set_audience(&[aud]);
    } else {
        validation.validate_aud = false;
    }

    if let Some(iss) = &config.issuer {
        validation.set_issuer(&[iss]);
    }

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_ref());

    let token_data = decode::<IdTokenClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::warn!(error = %e, "ID token verification failed");
        AuthError::InvalidToken
    })?;

    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
pub(crate) fn extract_bearer_token(header: &HeaderValue) -> Result<String, AuthError> {
    let header_str = header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorizationFormat)?;

    match header_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AuthError::InvalidAuthorizationFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        let header = jsonwebtoken::Header::new(Algorithm::HS256);
        let encoding_key = jsonwebtoken::EncodingKey::from_secret(secret.as_ref());
        jsonwebtoken::encode(&header, claims, &encoding_key).expect("Failed to encode JWT")
    }

    #[test]
    fn test_extract_bearer_token() {
        let header = HeaderValue::from_static("Bearer abc123");
        assert_eq!(extract_bearer_token(&header).unwrap(), "abc123");

        // Missing scheme
        let header = HeaderValue::from_static("abc123");
        assert!(extract_bearer_token(&header).is_err());

        // Basic auth (wrong type)
        let header = HeaderValue::from_static("Basic abc123");
        assert!(extract_bearer_token(&header).is_err());

        // Scheme without token
        let header = HeaderValue::from_static("Bearer ");
        assert!(extract_bearer_token(&header).is_err());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = AuthConfig {
            jwt_secret: "test_secret".to_string(),
            issuer: Some("https://example.com".to_string()),
            audience: Some("snipr".to_string()),
        };

        assert!(validate_jwt_token("invalid_token", &config).is_err());
    }

    #[test]
    fn test_jwt_roundtrip_no_issuer_no_audience() {
        let config = AuthConfig {
            jwt_secret: "test-secret-key".to_string(),
            issuer: None,
            audience: None,
        };

        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({
                "sub": "firebase-uid-1",
                "email": "trader@example.com",
                "aud": "some-project",
                "iat": now,
                "exp": now + 3600,
            }),
            &config.jwt_secret,
        );

        let decoded = validate_jwt_token(&token, &config).unwrap();
        assert_eq!(decoded.sub, "firebase-uid-1");
        assert_eq!(decoded.email.as_deref(), Some("trader@example.com"));
    }

    #[test]
    fn test_jwt_wrong_audience_rejected() {
        let config = AuthConfig {
            jwt_secret: "test-secret-key".to_string(),
            issuer: None,
            audience: Some("snipr".to_string()),
        };

        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({
                "sub": "uid",
                "aud": "someone-else",
                "iat": now,
                "exp": now + 3600,
            }),
            &config.jwt_secret,
        );

        assert!(matches!(
            validate_jwt_token(&token, &config),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_jwt_expired_rejected() {
        let config = AuthConfig {
            jwt_secret: "test-secret-key".to_string(),
            issuer: None,
            audience: None,
        };

        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({
                "sub": "uid",
                "iat": now - 7200,
                "exp": now - 3600,
            }),
            &config.jwt_secret,
        );

        assert!(validate_jwt_token(&token, &config).is_err());
    }
}
