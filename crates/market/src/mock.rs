//! Mock market data service for tests and local development

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{MarketDataService, MarketError};

/// Serves scripted close series; unknown tickers are `NotFound`
#[derive(Clone, Default)]
pub struct MockMarketData {
    series: Arc<Mutex<HashMap<String, Vec<f64>>>>,
    failing: Arc<Mutex<Vec<String>>>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the close series for `ticker` (chainable)
    pub fn with_closes(self, ticker: &str, closes: &[f64]) -> Self {
        if let Ok(mut series) = self.series.lock() {
            series.insert(ticker.to_string(), closes.to_vec());
        }
        self
    }

    /// Make lookups for `ticker` fail with a request error (chainable)
    pub fn with_failure(self, ticker: &str) -> Self {
        if let Ok(mut failing) = self.failing.lock() {
            failing.push(ticker.to_string());
        }
        self
    }

    /// Tickers looked up so far, in order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl MarketDataService for MockMarketData {
    async fn closing_prices(&self, ticker: &str) -> Result<Vec<f64>, MarketError> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push(ticker.to_string());
        }

        let failing = self
            .failing
            .lock()
            .map(|f| f.iter().any(|t| t == ticker))
            .unwrap_or(false);
        if failing {
            return Err(MarketError::Request(format!(
                "Mock failure for {}",
                ticker
            )));
        }

        self.series
            .lock()
            .ok()
            .and_then(|series| series.get(ticker).cloned())
            .ok_or_else(|| MarketError::NotFound(ticker.to_string()))
    }
}
