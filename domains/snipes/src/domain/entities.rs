//! Domain entities for the Snipes domain

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::extraction::TickerCalls;
use super::fact_check::FactCheck;

/// Application user as stored by the sign-up flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppUser {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl AppUser {
    /// Username if one was chosen
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Stored reliability report for one social-media account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SnipeRecord {
    pub owner_username: String,
    pub twitter_username: String,
    pub twitter_link: String,
    /// Tickers joined with ", "
    pub tickers: String,
    pub reliability_score: i32,
    pub breakdown: Json<BTreeMap<String, Option<bool>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SnipeRecord {
    /// Build the report for `handle` owned by `owner_username`
    pub fn new(
        owner_username: &str,
        handle: &str,
        profile_url: &str,
        calls: &TickerCalls,
        check: &FactCheck,
    ) -> Self {
        let now = Utc::now();
        Self {
            owner_username: owner_username.to_string(),
            twitter_username: handle.to_string(),
            twitter_link: profile_url.to_string(),
            tickers: calls.keys().cloned().collect::<Vec<_>>().join(", "),
            reliability_score: check.reliability() as i32,
            breakdown: Json(check.breakdown.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}
