//! Snipr Timeline Scraper
//!
//! Collects the visible post texts from a social-media profile:
//! - WebDriver implementation that logs in with a service account and
//!   scrolls the profile timeline in a real browser
//! - Mock scraper returning canned posts for tests and local development

pub mod mock;
pub mod timeline;
pub mod webdriver;

use std::time::Duration;

use thiserror::Error;

pub use timeline::{collect_timeline, Browser, LoginCredentials, ScrollTimings, WebDriverScraper};

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Scraper configuration error: {0}")]
    Configuration(String),

    #[error("WebDriver request error: {0}")]
    Request(String),

    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    #[error("Unexpected WebDriver response: {0}")]
    Response(String),
}

impl ScrapeError {
    /// True when the driver reported a missing element
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, ScrapeError::WebDriver { error, .. } if error == "no such element")
    }
}

/// Scraper configuration
#[derive(Clone)]
pub struct ScraperConfig {
    /// Provider name (webdriver, mock)
    pub provider: String,
    /// Remote end (chromedriver / selenium) URL
    pub webdriver_url: String,
    /// Base URL of the social site
    pub site_url: String,
    /// Service account used to log in
    pub login_email: Option<String>,
    pub login_password: Option<String>,
    pub headless: bool,
    pub max_scroll_attempts: usize,
    pub timings: ScrollTimings,
}

impl std::fmt::Debug for ScraperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperConfig")
            .field("provider", &self.provider)
            .field("webdriver_url", &self.webdriver_url)
            .field("site_url", &self.site_url)
            .field("login_email", &self.login_email)
            .field("headless", &self.headless)
            .field("max_scroll_attempts", &self.max_scroll_attempts)
            .finish_non_exhaustive()
    }
}

impl ScraperConfig {
    /// Create scraper config from environment variables
    pub fn from_env() -> Result<Self, ScrapeError> {
        dotenvy::dotenv().ok();

        let provider =
            std::env::var("SCRAPER_PROVIDER").unwrap_or_else(|_| "webdriver".to_string());
        let webdriver_url = std::env::var("WEBDRIVER_URL")
            .unwrap_or_else(|_| "http://localhost:9515".to_string());
        let site_url =
            std::env::var("SCRAPER_SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_string());

        let login_email = std::env::var("STATS_EMAIL").ok();
        let login_password = std::env::var("STATS_PASSWORD").ok();

        let headless = std::env::var("SCRAPER_HEADLESS")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let max_scroll_attempts = std::env::var("SCRAPER_MAX_SCROLLS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(timeline::DEFAULT_MAX_SCROLL_ATTEMPTS);

        Ok(Self {
            provider,
            webdriver_url,
            site_url,
            login_email,
            login_password,
            headless,
            max_scroll_attempts,
            timings: ScrollTimings::default(),
        })
    }
}

/// Scraper trait for different backends
#[async_trait::async_trait]
pub trait TimelineScraper: Send + Sync {
    /// Fetch up to `limit` distinct post texts from the profile `handle`.
    ///
    /// A failed login is not an error: it yields an empty list.
    async fn fetch_posts(&self, handle: &str, limit: usize) -> Result<Vec<String>, ScrapeError>;

    /// Public link of the profile this scraper would open for `handle`
    fn profile_url(&self, handle: &str) -> String;
}

/// Factory for creating TimelineScraper implementations
pub struct ScraperFactory;

impl ScraperFactory {
    pub fn create(config: ScraperConfig) -> Result<Box<dyn TimelineScraper>, ScrapeError> {
        match config.provider.as_str() {
            "webdriver" => {
                tracing::info!(webdriver_url = %config.webdriver_url, "Creating WebDriver scraper");
                Ok(Box::new(WebDriverScraper::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock scraper");
                Ok(Box::new(mock::MockScraper::new()))
            }
            provider => Err(ScrapeError::Configuration(format!(
                "Unknown scraper provider: {}. Supported providers: webdriver, mock",
                provider
            ))),
        }
    }
}

/// Social site scraped when `SCRAPER_SITE_URL` is unset
pub const DEFAULT_SITE_URL: &str = "https://x.com";

/// `{site}/{handle}` with any trailing slash on the site dropped
pub fn profile_url(site_url: &str, handle: &str) -> String {
    format!("{}/{}", site_url.trim_end_matches('/'), handle)
}

/// Extract the profile handle from a profile URL (`https://x.com/jack/` -> `jack`)
pub fn handle_from_url(url: &str) -> String {
    url.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_start_matches('@')
        .to_string()
}

/// Default WebDriver command timeout
pub(crate) const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
