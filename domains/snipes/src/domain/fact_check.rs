//! Fact checking ticker calls against closing prices

use std::collections::BTreeMap;

use snipr_market::MarketDataService;

use super::extraction::{Sentiment, TickerCalls};

/// Outcome of checking every call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactCheck {
    pub correct: usize,
    pub total: usize,
    /// `None` when no price data was available for the ticker
    pub breakdown: BTreeMap<String, Option<bool>>,
}

impl FactCheck {
    /// Share of correct calls as a whole percentage (0 when there were no calls)
    pub fn reliability(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        // Ties round to even
        ((self.correct as f64 / self.total as f64) * 100.0).round_ties_even() as u32
    }
}

/// Judge a single call against a close series (oldest first)
pub fn judge_call(sentiment: &Sentiment, closes: &[f64]) -> Option<bool> {
    let (start, end) = (closes.first()?, closes.last()?);
    Some(match sentiment {
        Sentiment::Bullish => end > start,
        Sentiment::Bearish => end < start,
        Sentiment::Other(_) => false,
    })
}

/// Check every call; market errors for a ticker are logged and recorded as `None`
pub async fn fact_check(market: &dyn MarketDataService, calls: &TickerCalls) -> FactCheck {
    let mut result = FactCheck {
        total: calls.len(),
        ..FactCheck::default()
    };

    for (ticker, sentiment) in calls {
        let verdict = match market.closing_prices(ticker).await {
            Ok(closes) => judge_call(sentiment, &closes),
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "Market data unavailable");
                None
            }
        };

        if verdict == Some(true) {
            result.correct += 1;
        }
        result.breakdown.insert(ticker.clone(), verdict);
    }

    result
}
