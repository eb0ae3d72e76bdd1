//! Ticker-call extraction
//!
//! Builds the analysis prompt sent to the language model and parses its
//! `TICKER: sentiment` lines back into calls.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// System prompt for the analysis completion
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a financial analysis assistant.";

/// Sampling temperature for the analysis completion
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

/// Token cap for the analysis completion
pub const ANALYSIS_MAX_TOKENS: u32 = 500;

/// Direction a post author called for a ticker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentiment {
    Bullish,
    Bearish,
    /// Anything else the model produced; never counted as correct
    Other(String),
}

impl Sentiment {
    /// Parse a label, case-insensitively
    pub fn parse(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "bullish" => Sentiment::Bullish,
            "bearish" => Sentiment::Bearish,
            _ => Sentiment::Other(label),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Other(label) => label,
        }
    }
}

impl std::fmt::Display for Sentiment {
    #[mutants::skip] // Delegates to as_str()
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Calls keyed by ticker; a later line for the same ticker wins
pub type TickerCalls = BTreeMap<String, Sentiment>;

/// Build the user prompt asking the model to label every ticker in `posts`
pub fn build_analysis_prompt(posts: &[String]) -> String {
    let listing = posts
        .iter()
        .enumerate()
        .map(|(i, post)| format!("{}. {}", i + 1, post.replace('\n', " ")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze the following recent posts for stock-related calls.\n\
         For each ticker mentioned, label it as 'bullish' or 'bearish', whatever the author called.\n\
         Format the response as one per line like this:\n\
         AAPL: bullish\n\
         TSLA: bearish\n\
         \n\
         Posts:\n\
         {}",
        listing
    )
}

/// Parse `TICKER: sentiment` lines out of the model's reply.
///
/// Lines without exactly one colon are ignored, as are lines whose ticker is
/// empty once list markers and `$` are removed.
pub fn parse_ticker_calls(text: &str) -> TickerCalls {
    let mut calls = TickerCalls::new();

    for line in text.lines() {
        let mut parts = line.split(':');
        let (Some(ticker), Some(sentiment), None) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };

        let ticker = ticker
            .trim()
            .trim_start_matches(['-', '*'])
            .replace('$', "")
            .trim()
            .to_uppercase();
        if ticker.is_empty() {
            continue;
        }

        calls.insert(ticker, Sentiment::parse(sentiment));
    }

    calls
}
