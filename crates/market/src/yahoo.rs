//! Yahoo Finance chart API implementation
//!
//! `GET {base}/v8/finance/chart/{ticker}?range={range}&interval=1d`

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::{MarketConfig, MarketDataService, MarketError};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// The chart API rejects requests without a browser-like agent
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

/// Yahoo chart API market data service
pub struct YahooMarketData {
    client: Client,
    base_url: Url,
    range: String,
}

impl YahooMarketData {
    pub fn new(config: MarketConfig) -> Result<Self, MarketError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MarketError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let raw_base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = Url::parse(raw_base)
            .map_err(|e| MarketError::Configuration(format!("Invalid base URL {:?}: {}", raw_base, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MarketError::Configuration(format!(
                "Base URL {:?} cannot carry a path",
                raw_base
            )));
        }

        Ok(Self {
            client,
            base_url,
            range: config.range,
        })
    }

    /// The ticker comes from model output, so it is pushed as one escaped segment
    fn chart_url(&self, ticker: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v8", "finance", "chart"])
                .push(ticker);
        }
        url
    }
}

/// Pull the close series out of a chart payload, dropping empty days
fn closes_from_envelope(ticker: &str, envelope: ChartEnvelope) -> Result<Vec<f64>, MarketError> {
    if let Some(error) = envelope.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(MarketError::NotFound(ticker.to_string()));
        }
        return Err(MarketError::Response(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let closes = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .and_then(|result| result.indicators.quote.into_iter().next())
        .map(|quote| quote.close.into_iter().flatten().collect())
        .unwrap_or_default();

    Ok(closes)
}

#[async_trait::async_trait]
impl MarketDataService for YahooMarketData {
    async fn closing_prices(&self, ticker: &str) -> Result<Vec<f64>, MarketError> {
        tracing::debug!(ticker = %ticker, range = %self.range, "Fetching closing prices");

        let response = self
            .client
            .get(self.chart_url(ticker))
            .query(&[("range", self.range.as_str()), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| MarketError::Request(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketError::RateLimit);
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketError::Response(format!("Failed to read body: {}", e)))?;

        // Error payloads share the chart envelope, so try it before the status
        match serde_json::from_str::<ChartEnvelope>(&body) {
            Ok(envelope) => closes_from_envelope(ticker, envelope),
            Err(_) if status == StatusCode::NOT_FOUND => {
                Err(MarketError::NotFound(ticker.to_string()))
            }
            Err(e) if status.is_success() => Err(MarketError::Response(format!(
                "Failed to parse chart response: {}",
                e
            ))),
            Err(_) => Err(MarketError::Response(format!(
                "Chart API returned {}: {}",
                status, body
            ))),
        }
    }
}
