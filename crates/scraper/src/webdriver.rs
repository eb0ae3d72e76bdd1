//! Minimal W3C WebDriver client
//!
//! Speaks the WebDriver wire protocol (JSON over HTTP) to a remote end such
//! as chromedriver or a Selenium grid. Only the commands the timeline
//! scraper needs are implemented.

use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{ScrapeError, COMMAND_TIMEOUT};

/// Key W3C WebDriver uses to tag element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// The Enter key as a WebDriver key code
pub const ENTER_KEY: &str = "\u{E007}";

/// Every WebDriver response wraps its payload in `value`
#[derive(Debug, Deserialize)]
struct Envelope {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorValue {
    error: String,
    #[serde(default)]
    message: String,
}

/// Opaque element reference returned by the remote end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

/// Element lookup strategy
#[derive(Debug, Clone, Copy)]
pub enum Locator<'a> {
    Css(&'a str),
    XPath(&'a str),
    Name(&'a str),
}

impl Locator<'_> {
    fn to_body(self) -> Value {
        match self {
            Locator::Css(selector) => json!({"using": "css selector", "value": selector}),
            Locator::XPath(path) => json!({"using": "xpath", "value": path}),
            // W3C dropped the name strategy; express it as a CSS attribute selector
            Locator::Name(name) => {
                json!({"using": "css selector", "value": format!("[name=\"{}\"]", name)})
            }
        }
    }
}

/// A live browser session on a remote end
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Start a new Chrome session
    pub async fn start(webdriver_url: &str, chrome_args: &[String]) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()
            .map_err(|e| ScrapeError::Configuration(format!("HTTP client: {}", e)))?;

        let base_url = webdriver_url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": chrome_args }
                }
            }
        });

        let value = send(
            &client,
            Method::POST,
            &format!("{}/session", base_url),
            Some(capabilities),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ScrapeError::Response("new session without sessionId".to_string()))?
            .to_string();

        tracing::info!(session_id = %session_id, "Browser session started");

        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ScrapeError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        send(&self.client, method, &url, body).await
    }

    /// Navigate to a URL
    pub async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    /// Find a single element
    pub async fn find(&self, locator: Locator<'_>) -> Result<ElementRef, ScrapeError> {
        let value = self
            .command(Method::POST, "/element", Some(locator.to_body()))
            .await?;
        element_ref(&value)
    }

    /// Find all matching elements (empty when none match)
    pub async fn find_all(&self, locator: Locator<'_>) -> Result<Vec<ElementRef>, ScrapeError> {
        let value = self
            .command(Method::POST, "/elements", Some(locator.to_body()))
            .await?;

        value
            .as_array()
            .ok_or_else(|| ScrapeError::Response("elements result is not an array".to_string()))?
            .iter()
            .map(element_ref)
            .collect()
    }

    /// Type text into an element
    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), ScrapeError> {
        self.command(
            Method::POST,
            &format!("/element/{}/value", element.0),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    /// Rendered text of an element
    pub async fn text(&self, element: &ElementRef) -> Result<String, ScrapeError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.0), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Run a synchronous script and return its result
    pub async fn execute(&self, script: &str) -> Result<Value, ScrapeError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": [] })),
        )
        .await
    }

    /// End the session and close the browser
    pub async fn quit(&self) -> Result<(), ScrapeError> {
        self.command(Method::DELETE, "", None).await?;
        tracing::info!(session_id = %self.session_id, "Browser session closed");
        Ok(())
    }
}

async fn send(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, ScrapeError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ScrapeError::Request(format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ScrapeError::Request(format!("Failed to read body: {}", e)))?;

    parse_envelope(status.is_success(), &text)
}

/// Unwrap `{"value": ...}`, turning W3C error payloads into `ScrapeError::WebDriver`
fn parse_envelope(success: bool, body: &str) -> Result<Value, ScrapeError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| ScrapeError::Response(format!("invalid JSON ({}): {}", e, body)))?;

    if !success {
        return match serde_json::from_value::<ErrorValue>(envelope.value) {
            Ok(err) => Err(ScrapeError::WebDriver {
                error: err.error,
                message: err.message,
            }),
            Err(_) => Err(ScrapeError::Response(body.to_string())),
        };
    }

    Ok(envelope.value)
}

fn element_ref(value: &Value) -> Result<ElementRef, ScrapeError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
        .ok_or_else(|| ScrapeError::Response(format!("not an element reference: {}", value)))
}
