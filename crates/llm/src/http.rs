//! HTTP plumbing shared by the provider adapters

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::LlmError;

/// Upper bound on a single completion round trip
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn build_client() -> Result<Client, LlmError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Send a prepared request and decode a JSON body.
///
/// `describe_error` turns a provider error body into a readable message;
/// when it returns `None` the raw status and body are reported.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
    describe_error: fn(&str) -> Option<String>,
) -> Result<T, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::Request(format!("HTTP request failed: {}", e)))?;

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimit);
    }

    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());

        return Err(LlmError::Response(match describe_error(&error_body) {
            Some(detail) => format!("{} API error {}", provider, detail),
            None => format!("{} API returned {}: {}", provider, status, error_body),
        }));
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))
}
