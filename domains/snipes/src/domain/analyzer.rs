//! Analyze pipeline: scrape, extract, fact-check

use std::sync::Arc;

use snipr_common::Error;
use snipr_llm::{CompletionRequest, LlmError, LlmMessage, LlmService};
use snipr_market::MarketDataService;
use snipr_scraper::{ScrapeError, TimelineScraper};

use super::extraction::{
    build_analysis_prompt, parse_ticker_calls, TickerCalls, ANALYSIS_MAX_TOKENS,
    ANALYSIS_SYSTEM_PROMPT, ANALYSIS_TEMPERATURE,
};
use super::fact_check::{fact_check, FactCheck};

/// Number of posts scraped per analysis
pub const POST_LIMIT: usize = 30;

/// Model used for extraction unless configured otherwise
pub const DEFAULT_ANALYSIS_MODEL: &str = "gpt-4";

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("Scraping failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Analysis failed: {0}")]
    Llm(#[from] LlmError),

    #[error("LLM service is not configured")]
    LlmNotConfigured,
}

impl From<AnalyzeError> for Error {
    fn from(err: AnalyzeError) -> Self {
        match err {
            AnalyzeError::LlmNotConfigured => Error::Internal(err.to_string()),
            AnalyzeError::Scrape(_) | AnalyzeError::Llm(_) => Error::Upstream(err.to_string()),
        }
    }
}

/// Result of analyzing one account
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Profile link on the site that was scraped
    pub profile_url: String,
    pub post_count: usize,
    pub calls: TickerCalls,
    pub fact_check: FactCheck,
}

/// Sequences the scraper, the language model and the market data service
#[derive(Clone)]
pub struct SnipeAnalyzer {
    scraper: Arc<dyn TimelineScraper>,
    llm: Option<Arc<dyn LlmService>>,
    market: Arc<dyn MarketDataService>,
    model: String,
}

impl SnipeAnalyzer {
    pub fn new(
        scraper: Arc<dyn TimelineScraper>,
        llm: Option<Arc<dyn LlmService>>,
        market: Arc<dyn MarketDataService>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            scraper,
            llm,
            market,
            model: model.into(),
        }
    }

    /// Scrape `handle`, extract its ticker calls and check them
    pub async fn analyze(&self, handle: &str) -> Result<Analysis, AnalyzeError> {
        let llm = self.llm.as_ref().ok_or(AnalyzeError::LlmNotConfigured)?;

        let posts = self.scraper.fetch_posts(handle, POST_LIMIT).await?;
        tracing::info!(handle = %handle, post_count = posts.len(), "Scraped timeline");

        let response = llm
            .complete(CompletionRequest {
                model: self.model.clone(),
                system_prompt: Some(ANALYSIS_SYSTEM_PROMPT.to_string()),
                messages: vec![LlmMessage::user(build_analysis_prompt(&posts))],
                max_tokens: Some(ANALYSIS_MAX_TOKENS),
                temperature: Some(ANALYSIS_TEMPERATURE),
            })
            .await?;

        tracing::debug!(analysis = %response.content, "Analysis response");

        let calls = parse_ticker_calls(response.content.trim());
        let fact_check = fact_check(self.market.as_ref(), &calls).await;

        tracing::info!(
            handle = %handle,
            calls = calls.len(),
            correct = fact_check.correct,
            "Fact-checked ticker calls"
        );

        Ok(Analysis {
            profile_url: self.scraper.profile_url(handle),
            post_count: posts.len(),
            calls,
            fact_check,
        })
    }
}
