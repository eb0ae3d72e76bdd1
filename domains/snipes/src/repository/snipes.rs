//! Snipe report repository

use snipr_common::RepositoryError;
use sqlx::PgPool;

use crate::domain::entities::SnipeRecord;

#[derive(Clone)]
pub struct SnipeRepository {
    pool: PgPool,
}

impl SnipeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the report for `(owner_username, twitter_username)`
    pub async fn upsert(&self, record: &SnipeRecord) -> Result<SnipeRecord, RepositoryError> {
        let saved = sqlx::query_as::<_, SnipeRecord>(
            r#"
            INSERT INTO snipes (
                owner_username, twitter_username, twitter_link, tickers,
                reliability_score, breakdown, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (owner_username, twitter_username) DO UPDATE SET
                twitter_link = EXCLUDED.twitter_link,
                tickers = EXCLUDED.tickers,
                reliability_score = EXCLUDED.reliability_score,
                breakdown = EXCLUDED.breakdown,
                updated_at = EXCLUDED.updated_at
            RETURNING owner_username, twitter_username, twitter_link, tickers,
                      reliability_score, breakdown, created_at, updated_at
            "#,
        )
        .bind(&record.owner_username)
        .bind(&record.twitter_username)
        .bind(&record.twitter_link)
        .bind(&record.tickers)
        .bind(record.reliability_score)
        .bind(&record.breakdown)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}
