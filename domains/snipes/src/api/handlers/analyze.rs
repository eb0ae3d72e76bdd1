//! Account analysis handler

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use snipr_auth::AuthUser;
use snipr_common::{Error, Result, ValidatedJson};
use snipr_scraper::handle_from_url;
use validator::Validate;

use crate::api::middleware::SnipesState;
use crate::domain::entities::SnipeRecord;

/// Request for analyzing an account
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Profile URL, e.g. `https://x.com/jack`
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing 'twitterUrl' in request"))]
    pub twitter_url: String,
}

/// Analysis response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub reliability: u32,
    pub tweet_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<BTreeMap<String, Option<bool>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalyzeResponse {
    fn no_calls(tweet_count: usize) -> Self {
        Self {
            success: true,
            reliability: 0,
            tweet_count,
            breakdown: None,
            message: Some("No ticker calls found.".to_string()),
        }
    }
}

/// Scrape an account, fact-check its ticker calls and store the report
pub async fn analyze(
    AuthUser(ctx): AuthUser,
    State(state): State<SnipesState>,
    ValidatedJson(req): ValidatedJson<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    let handle = handle_from_url(&req.twitter_url);
    if handle.is_empty() {
        return Err(Error::Validation(
            "Missing 'twitterUrl' in request".to_string(),
        ));
    }

    tracing::info!(uid = %ctx.uid, handle = %handle, "Analyzing account");

    let analysis = state.analyzer.analyze(&handle).await?;

    if analysis.calls.is_empty() {
        tracing::info!(handle = %handle, "No ticker calls found");
        return Ok(Json(AnalyzeResponse::no_calls(analysis.post_count)));
    }

    let user = state
        .repos
        .users
        .find(&ctx.uid)
        .await
        .map_err(|e| {
            tracing::error!(uid = %ctx.uid, error = %e, "User lookup failed");
            Error::Internal("User lookup failed".to_string())
        })?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    let owner = user
        .username()
        .ok_or_else(|| Error::Validation("Username not found".to_string()))?;

    let record = SnipeRecord::new(
        owner,
        &handle,
        &analysis.profile_url,
        &analysis.calls,
        &analysis.fact_check,
    );

    // The report is still returned when it cannot be stored
    match state.repos.snipes.upsert(&record).await {
        Ok(_) => tracing::info!(owner = %owner, handle = %handle, "Snipe saved"),
        Err(e) => tracing::error!(owner = %owner, handle = %handle, error = %e, "Snipe write failed"),
    }

    Ok(Json(AnalyzeResponse {
        success: true,
        reliability: analysis.fact_check.reliability(),
        tweet_count: analysis.post_count,
        breakdown: Some(analysis.fact_check.breakdown),
        message: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_camel_case() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"twitterUrl": "https://x.com/jack"}"#).unwrap();
        assert_eq!(req.twitter_url, "https://x.com/jack");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_request_missing_url_fails_validation() {
        let req: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_no_calls_shape() {
        let value = serde_json::to_value(AnalyzeResponse::no_calls(12)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "success": true,
                "reliability": 0,
                "tweetCount": 12,
                "message": "No ticker calls found."
            })
        );
    }

    #[test]
    fn test_report_shape_keeps_null_breakdown_entries() {
        let response = AnalyzeResponse {
            success: true,
            reliability: 50,
            tweet_count: 30,
            breakdown: Some(BTreeMap::from([
                ("AAPL".to_string(), Some(true)),
                ("GME".to_string(), None),
            ])),
            message: None,
        };

        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["breakdown"]["GME"], serde_json::Value::Null);
        assert_eq!(value["breakdown"]["AAPL"], true);
        assert!(value.get("message").is_none());
    }
}
