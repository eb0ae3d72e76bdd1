//! Timeline scroll loop
//!
//! Logs in, opens the profile, then alternates between harvesting post
//! texts and scrolling until enough posts are collected, the page stops
//! growing, or the scroll budget runs out.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::webdriver::{Locator, WebDriverSession, ENTER_KEY};
use crate::{profile_url, ScrapeError, ScraperConfig, TimelineScraper};

pub(crate) const DEFAULT_MAX_SCROLL_ATTEMPTS: usize = 40;

/// Post bodies on the profile timeline
const POST_TEXT_XPATH: &str = "//article//div[@lang]";

const SCROLL_HEIGHT_SCRIPT: &str = "return document.body.scrollHeight";
const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Pauses that let the page settle between browser actions
#[derive(Debug, Clone)]
pub struct ScrollTimings {
    pub login_page: Duration,
    pub after_email: Duration,
    pub after_password: Duration,
    pub profile_page: Duration,
    pub after_scroll: Duration,
}

impl Default for ScrollTimings {
    fn default() -> Self {
        Self {
            login_page: Duration::from_secs(3),
            after_email: Duration::from_secs(2),
            after_password: Duration::from_secs(5),
            profile_page: Duration::from_secs(5),
            after_scroll: Duration::from_millis(3500),
        }
    }
}

impl ScrollTimings {
    /// No waiting at all
    pub fn immediate() -> Self {
        Self {
            login_page: Duration::ZERO,
            after_email: Duration::ZERO,
            after_password: Duration::ZERO,
            profile_page: Duration::ZERO,
            after_scroll: Duration::ZERO,
        }
    }
}

/// Browser operations the scroll loop relies on
#[async_trait::async_trait]
pub trait Browser: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError>;

    /// Type `text` into the input with the given `name` attribute
    async fn type_into(&self, name: &str, text: &str) -> Result<(), ScrapeError>;

    /// Texts of every element matching `xpath`; unreadable elements are skipped
    async fn texts(&self, xpath: &str) -> Result<Vec<String>, ScrapeError>;

    async fn scroll_to_bottom(&self) -> Result<(), ScrapeError>;

    async fn scroll_height(&self) -> Result<i64, ScrapeError>;

    /// End the session; the browser process goes with it
    async fn close(&self) -> Result<(), ScrapeError>;
}

#[async_trait::async_trait]
impl Browser for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        WebDriverSession::goto(self, url).await
    }

    async fn type_into(&self, name: &str, text: &str) -> Result<(), ScrapeError> {
        let element = self.find(Locator::Name(name)).await?;
        self.send_keys(&element, text).await
    }

    async fn texts(&self, xpath: &str) -> Result<Vec<String>, ScrapeError> {
        let elements = self.find_all(Locator::XPath(xpath)).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            // Elements go stale while the timeline re-renders
            match self.text(element).await {
                Ok(text) => texts.push(text),
                Err(e) => tracing::debug!(error = %e, "Skipping unreadable post element"),
            }
        }
        Ok(texts)
    }

    async fn scroll_to_bottom(&self) -> Result<(), ScrapeError> {
        self.execute(SCROLL_TO_BOTTOM_SCRIPT).await?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64, ScrapeError> {
        let value = self.execute(SCROLL_HEIGHT_SCRIPT).await?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|h| h as i64))
            .ok_or_else(|| ScrapeError::Response(format!("scrollHeight is not a number: {}", value)))
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        self.quit().await
    }
}

/// Closes the browser if the scrape is dropped before it finishes
struct CloseOnDrop<B: Browser + 'static> {
    browser: Option<Arc<B>>,
}

impl<B: Browser + 'static> CloseOnDrop<B> {
    fn new(browser: Arc<B>) -> Self {
        Self {
            browser: Some(browser),
        }
    }

    async fn close(mut self) {
        if let Some(browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "Failed to close browser session");
            }
        }
    }
}

impl<B: Browser + 'static> Drop for CloseOnDrop<B> {
    fn drop(&mut self) {
        let Some(browser) = self.browser.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime to close abandoned browser session");
            return;
        };

        tracing::info!("Scrape cancelled, closing browser session");
        runtime.spawn(async move {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "Failed to close abandoned browser session");
            }
        });
    }
}

/// Run the scroll loop and close the browser afterwards, including when the
/// caller stops waiting midway.
pub async fn collect_and_close<B: Browser + 'static>(
    browser: Arc<B>,
    config: &ScraperConfig,
    credentials: Option<&LoginCredentials>,
    handle: &str,
    limit: usize,
) -> Result<Vec<String>, ScrapeError> {
    let guard = CloseOnDrop::new(Arc::clone(&browser));

    let result = collect_timeline(
        browser.as_ref(),
        &config.site_url,
        handle,
        limit,
        credentials,
        &config.timings,
        config.max_scroll_attempts,
    )
    .await;

    guard.close().await;
    result
}

/// Service-account credentials for the social site
#[derive(Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Log in and scroll `handle`'s timeline, collecting up to `limit` distinct posts.
///
/// Returns an empty list when the login fails.
pub async fn collect_timeline<B: Browser + ?Sized>(
    browser: &B,
    site_url: &str,
    handle: &str,
    limit: usize,
    credentials: Option<&LoginCredentials>,
    timings: &ScrollTimings,
    max_scroll_attempts: usize,
) -> Result<Vec<String>, ScrapeError> {
    let site_url = site_url.trim_end_matches('/');

    browser.goto(&format!("{}/login", site_url)).await?;
    tokio::time::sleep(timings.login_page).await;

    if let Err(e) = log_in(browser, credentials, timings).await {
        tracing::error!(error = %e, "Login failed");
        return Ok(Vec::new());
    }
    tracing::info!("Logged in with service account");

    let profile = profile_url(site_url, handle);
    tracing::info!(url = %profile, "Navigating to profile");
    browser.goto(&profile).await?;
    tokio::time::sleep(timings.profile_page).await;

    let mut seen = HashSet::new();
    let mut posts = Vec::new();
    let mut attempt = 0;
    let mut last_height = browser.scroll_height().await?;

    while posts.len() < limit && attempt < max_scroll_attempts {
        tracing::debug!(attempt = attempt + 1, collected = posts.len(), "Scroll attempt");

        for text in browser.texts(POST_TEXT_XPATH).await? {
            if seen.insert(text.clone()) {
                posts.push(text);
            }
        }

        browser.scroll_to_bottom().await?;
        tokio::time::sleep(timings.after_scroll).await;

        let new_height = browser.scroll_height().await?;
        if new_height == last_height {
            tracing::info!("No new posts loaded, stopping scroll");
            break;
        }
        last_height = new_height;
        attempt += 1;
    }

    posts.truncate(limit);
    tracing::info!(count = posts.len(), handle = %handle, "Fetched posts");
    Ok(posts)
}

async fn log_in<B: Browser + ?Sized>(
    browser: &B,
    credentials: Option<&LoginCredentials>,
    timings: &ScrollTimings,
) -> Result<(), ScrapeError> {
    let credentials = credentials.ok_or_else(|| {
        ScrapeError::Configuration("STATS_EMAIL / STATS_PASSWORD not set".to_string())
    })?;

    browser.type_into("text", &credentials.email).await?;
    browser.type_into("text", ENTER_KEY).await?;
    tokio::time::sleep(timings.after_email).await;

    browser.type_into("password", &credentials.password).await?;
    browser.type_into("password", ENTER_KEY).await?;
    tokio::time::sleep(timings.after_password).await;

    Ok(())
}

/// Scraper driving a real browser through a WebDriver remote end
pub struct WebDriverScraper {
    config: ScraperConfig,
    credentials: Option<LoginCredentials>,
}

impl WebDriverScraper {
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        if config.webdriver_url.trim().is_empty() {
            return Err(ScrapeError::Configuration(
                "WEBDRIVER_URL must not be empty".to_string(),
            ));
        }

        let credentials = match (&config.login_email, &config.login_password) {
            (Some(email), Some(password)) => Some(LoginCredentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => {
                tracing::warn!("Scraper login credentials missing; logins will fail");
                None
            }
        };

        Ok(Self {
            config,
            credentials,
        })
    }

    fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-gpu".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if self.config.headless {
            args.push("--headless=new".to_string());
        }
        args
    }
}

#[async_trait::async_trait]
impl TimelineScraper for WebDriverScraper {
    async fn fetch_posts(&self, handle: &str, limit: usize) -> Result<Vec<String>, ScrapeError> {
        let session =
            WebDriverSession::start(&self.config.webdriver_url, &self.chrome_args()).await?;

        collect_and_close(
            Arc::new(session),
            &self.config,
            self.credentials.as_ref(),
            handle,
            limit,
        )
        .await
    }

    fn profile_url(&self, handle: &str) -> String {
        profile_url(&self.config.site_url, handle)
    }
}
