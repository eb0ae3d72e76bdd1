//! Mock timeline scraper for tests and local development

use std::sync::{Arc, Mutex};

use crate::{profile_url, ScrapeError, TimelineScraper, DEFAULT_SITE_URL};

/// Scraper returning canned posts and recording the handles it was asked for
#[derive(Clone, Default)]
pub struct MockScraper {
    posts: Arc<Mutex<Vec<String>>>,
    requested: Arc<Mutex<Vec<String>>>,
    fail_with: Arc<Mutex<Option<String>>>,
    site_url: Arc<Mutex<Option<String>>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that serves the given posts for every handle
    pub fn with_posts<I, S>(posts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        mock.set_posts(posts);
        mock
    }

    pub fn set_posts<I, S>(&self, posts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut stored) = self.posts.lock() {
            *stored = posts.into_iter().map(Into::into).collect();
        }
    }

    /// Make every subsequent fetch fail with a WebDriver error
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = Some(message.into());
        }
    }

    /// Site the mock claims to scrape; defaults to the real one
    pub fn set_site_url(&self, url: impl Into<String>) {
        if let Ok(mut site) = self.site_url.lock() {
            *site = Some(url.into());
        }
    }

    /// Handles requested so far, in order
    pub fn requested_handles(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl TimelineScraper for MockScraper {
    async fn fetch_posts(&self, handle: &str, limit: usize) -> Result<Vec<String>, ScrapeError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(handle.to_string());
        }

        if let Some(message) = self.fail_with.lock().ok().and_then(|f| f.clone()) {
            return Err(ScrapeError::WebDriver {
                error: "unknown error".to_string(),
                message,
            });
        }

        let posts = self.posts.lock().map(|p| p.clone()).unwrap_or_default();
        tracing::info!(handle = %handle, count = posts.len().min(limit), "Mock scrape");
        Ok(posts.into_iter().take(limit).collect())
    }

    fn profile_url(&self, handle: &str) -> String {
        let site = self.site_url.lock().ok().and_then(|s| s.clone());
        profile_url(site.as_deref().unwrap_or(DEFAULT_SITE_URL), handle)
    }
}
