//! Anthropic Messages API adapter
//!
//! The system prompt travels in its own field and `max_tokens` is mandatory,
//! so both are resolved here before the request leaves.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, send_json};
use crate::{CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub(crate) const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Turn>,
}

#[derive(Debug, Serialize)]
struct Turn {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<Block>,
    stop_reason: Option<String>,
    usage: Usage,
}

/// Only `text` blocks carry a reply; tool blocks have no `text`
#[derive(Debug, Deserialize)]
struct Block {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: i32,
    output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

fn describe_error(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| format!("({}): {}", e.error.kind, e.error.message))
}

pub struct AnthropicService {
    client: Client,
    config: LlmConfig,
    endpoint: String,
}

impl AnthropicService {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let endpoint = format!("{}/v1/messages", base.trim_end_matches('/'));

        Ok(Self {
            client: build_client()?,
            config,
            endpoint,
        })
    }

    fn build_body(&self, request: CompletionRequest) -> MessagesRequest {
        MessagesRequest {
            model: if request.model.is_empty() {
                self.config.default_model.clone()
            } else {
                request.model
            },
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system: request.system_prompt,
            temperature: request.temperature,
            messages: request
                .messages
                .into_iter()
                .map(|m| Turn {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
        }
    }
}

impl From<MessagesResponse> for CompletionResponse {
    fn from(response: MessagesResponse) -> Self {
        let content = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<String>();

        CompletionResponse {
            content,
            model: response.model,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
            stop_reason: response
                .stop_reason
                .unwrap_or_else(|| "end_turn".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let api_key = self.config.require_api_key()?;
        let body = self.build_body(request);

        tracing::debug!(model = %body.model, max_tokens = body.max_tokens, "Sending Anthropic messages request");

        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: MessagesResponse = send_json(request, "Anthropic", describe_error).await?;
        Ok(response.into())
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
