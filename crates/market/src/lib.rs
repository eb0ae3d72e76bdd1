//! Snipr Market Data Service
//!
//! Daily closing prices for a ticker over a recent window:
//! - Yahoo Finance chart API implementation
//! - Mock implementation with scripted price series

pub mod mock;
pub mod yahoo;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Market configuration error: {0}")]
    Configuration(String),

    #[error("Market request error: {0}")]
    Request(String),

    #[error("Market response error: {0}")]
    Response(String),

    #[error("No market data for ticker {0}")]
    NotFound(String),

    #[error("Market API rate limit exceeded")]
    RateLimit,
}

/// Market data configuration
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Provider name (yahoo, mock)
    pub provider: String,
    /// Override for the API base URL
    pub base_url: Option<String>,
    /// History window, e.g. `5d`
    pub range: String,
}

impl MarketConfig {
    /// Create market config from environment variables
    pub fn from_env() -> Result<Self, MarketError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("MARKET_PROVIDER").unwrap_or_else(|_| "yahoo".to_string());
        let base_url = std::env::var("MARKET_BASE_URL").ok();
        let range = std::env::var("MARKET_RANGE").unwrap_or_else(|_| "5d".to_string());

        if range.trim().is_empty() {
            return Err(MarketError::Configuration(
                "MARKET_RANGE must not be empty".to_string(),
            ));
        }

        Ok(Self {
            provider,
            base_url,
            range,
        })
    }
}

/// Market data trait for different providers
#[async_trait::async_trait]
pub trait MarketDataService: Send + Sync {
    /// Daily closes for `ticker` over the configured window, oldest first.
    ///
    /// Days without a close are omitted; an empty series is not an error.
    async fn closing_prices(&self, ticker: &str) -> Result<Vec<f64>, MarketError>;
}

/// Factory for creating MarketDataService implementations
pub struct MarketDataFactory;

impl MarketDataFactory {
    pub fn create(config: MarketConfig) -> Result<Box<dyn MarketDataService>, MarketError> {
        match config.provider.as_str() {
            "yahoo" => {
                tracing::info!(range = %config.range, "Creating Yahoo market data service");
                Ok(Box::new(yahoo::YahooMarketData::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock market data service");
                Ok(Box::new(mock::MockMarketData::new()))
            }
            provider => Err(MarketError::Configuration(format!(
                "Unknown market provider: {}. Supported providers: yahoo, mock",
                provider
            ))),
        }
    }
}
