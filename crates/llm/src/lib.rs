//! Snipr LLM Service
//!
//! Chat-completion abstraction used by the analysis pipeline and the support
//! chat:
//! - OpenAI Chat Completions API (default provider)
//! - Anthropic Messages API
//! - Programmable mock for tests and local development

pub mod anthropic;
mod http;
pub mod mock;
pub mod openai;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,
}

/// Role of a conversational turn sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

/// A single message in a completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// Provider-agnostic completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Model name; empty means the provider default
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Provider-agnostic completion response
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// LLM service configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// Provider name (openai, anthropic, mock)
    pub provider: String,
    pub api_key: Option<String>,
    pub default_model: String,
    pub max_tokens: u32,
    /// Override the provider API base URL (proxies, tests)
    pub base_url: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LlmConfig {
    /// Create LLM config from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());

        let (key_var, default_model) = match provider.as_str() {
            "anthropic" => ("ANTHROPIC_API_KEY", anthropic::DEFAULT_MODEL),
            _ => ("OPENAI_API_KEY", openai::DEFAULT_MODEL),
        };

        let api_key = std::env::var(key_var)
            .ok()
            .filter(|k| !k.trim().is_empty());

        let default_model = std::env::var("LLM_DEFAULT_MODEL")
            .unwrap_or_else(|_| default_model.to_string());

        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024);

        let base_url = std::env::var("LLM_BASE_URL").ok();

        Ok(Self {
            provider,
            api_key,
            default_model,
            max_tokens,
            base_url,
        })
    }

    fn require_api_key(&self) -> Result<String, LlmError> {
        self.api_key.clone().ok_or_else(|| {
            LlmError::Configuration(format!("API key missing for provider {}", self.provider))
        })
    }
}

/// LLM service trait for different providers
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Run a chat completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> &str;
}

/// Factory for creating LlmService implementations
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "openai" => {
                tracing::info!("Creating OpenAI LLM service");
                config.require_api_key()?;
                Ok(Box::new(openai::OpenAiService::new(config)?))
            }
            "anthropic" => {
                tracing::info!("Creating Anthropic LLM service");
                config.require_api_key()?;
                Ok(Box::new(anthropic::AnthropicService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            provider => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}. Supported providers: openai, anthropic, mock",
                provider
            ))),
        }
    }
}
