//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"`. Replies can be
//! scripted in order; once the script is exhausted the mock echoes the last
//! user message. Every request is recorded for assertions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

/// Mock LLM service for testing
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmService {
    /// Create a new mock LLM service
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn push_reply(&self, content: impl Into<String>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(content.into()));
        self
    }

    /// Queue a failing call
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.into()));
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::info!("Mock LLM service processing completion request");

        let model = if request.model.is_empty() {
            "mock-model".to_string()
        } else {
            request.model.clone()
        };

        let next = self.script.lock().unwrap().pop_front();
        self.requests.lock().unwrap().push(request.clone());

        let content = match next {
            Some(Scripted::Reply(content)) => content,
            Some(Scripted::Fail(message)) => return Err(LlmError::Request(message)),
            None => {
                let last_message = request
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or("empty");
                format!("Mock response to: {}", last_message)
            }
        };

        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i32 / 4)
            .sum::<i32>();
        let output_tokens = content.len() as i32 / 4;

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "end_turn".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}
