//! Support chat service
//!
//! One chat turn: record the user message, ask the model with the knowledge
//! base as system prompt, sanitize and score its reply, escalate after
//! repeated unknown answers, and notify support about missing features.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use snipr_email::FeatureRequestNotice;
use snipr_llm::{CompletionRequest, LlmMessage, LlmService};

use crate::domain::entities::{ChatMessage, ChatRole};
use crate::domain::prompt::build_system_prompt;
use crate::domain::reply::{with_escalation, FeatureRequest, SupportReply, ESCALATION_THRESHOLD};
use crate::knowledge::KnowledgeBase;
use crate::notifier::FeatureRequestNotifier;
use crate::store::{ConversationStore, StoreError};

/// Model used for support replies unless configured otherwise
pub const DEFAULT_SUPPORT_MODEL: &str = "gpt-4o-mini";

/// Default address offered to users after repeated unknown answers
pub const DEFAULT_SUPPORT_EMAIL: &str = "ammukuul15@gmail.com";

const SUPPORT_TEMPERATURE: f32 = 0.2;

const MISCONFIGURED_REPLY: &str =
    "Server misconfiguration: OpenAI key is missing. Please contact the admin.";

const UNAVAILABLE_REPLY: &str =
    "I\u{2019}m having trouble reaching the AI service right now. Please try again.";

/// Support chat settings
#[derive(Debug, Clone)]
pub struct SupportConfig {
    pub model: String,
    pub support_email: String,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_SUPPORT_MODEL.to_string(),
            support_email: DEFAULT_SUPPORT_EMAIL.to_string(),
        }
    }
}

/// One incoming user message
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub conversation_id: String,
    pub username: String,
    pub route: Option<String>,
    pub message: String,
}

/// Reply returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatOutcome {
    pub reply: String,
    pub missing_feature: bool,
    pub feature_request: FeatureRequest,
}

impl ChatOutcome {
    fn plain(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            missing_feature: false,
            feature_request: FeatureRequest::default(),
        }
    }
}

#[derive(Clone)]
pub struct SupportChatService {
    llm: Option<Arc<dyn LlmService>>,
    store: ConversationStore,
    knowledge: Arc<KnowledgeBase>,
    notifier: FeatureRequestNotifier,
    config: SupportConfig,
}

impl SupportChatService {
    pub fn new(
        llm: Option<Arc<dyn LlmService>>,
        store: ConversationStore,
        knowledge: Arc<KnowledgeBase>,
        notifier: FeatureRequestNotifier,
        config: SupportConfig,
    ) -> Self {
        Self {
            llm,
            store,
            knowledge,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Handle one chat turn.
    ///
    /// Model failures produce an apology reply rather than an error.
    pub async fn chat(&self, turn: &ChatTurn) -> Result<ChatOutcome, StoreError> {
        let Some(llm) = self.llm.as_ref() else {
            tracing::error!("Support chat called without an LLM configured");
            return Ok(ChatOutcome::plain(MISCONFIGURED_REPLY));
        };

        let id = turn.conversation_id.as_str();
        self.store.get_or_create(id, &turn.username);
        self.store
            .append_message(id, ChatRole::User, &turn.message, turn.route.as_deref())?;

        let history = self.store.recent_messages(id)?;
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: Some(build_system_prompt(self.knowledge.text().await)),
            messages: history.iter().map(to_llm_message).collect(),
            max_tokens: None,
            temperature: Some(SUPPORT_TEMPERATURE),
        };

        let response = match llm.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(conversation_id = %id, error = %e, "Support chat completion failed");
                return Ok(ChatOutcome::plain(UNAVAILABLE_REPLY));
            }
        };

        let mut parsed = SupportReply::parse(&response.content);

        let unknown_count = if parsed.is_unknown() {
            self.store.increment_unknown(id)?
        } else {
            self.store.unknown_count(id)?
        };
        if unknown_count >= ESCALATION_THRESHOLD {
            parsed.reply = with_escalation(&parsed.reply, &self.config.support_email);
        }

        self.store
            .append_message(id, ChatRole::Assistant, &parsed.reply, None)?;

        tracing::info!(
            conversation_id = %id,
            missing_feature = parsed.missing_feature,
            unknown_count,
            "Support reply sent"
        );

        if parsed.missing_feature {
            self.notifier.notify_in_background(FeatureRequestNotice {
                username: turn.username.clone(),
                route: turn.route.clone().unwrap_or_default(),
                user_message: turn.message.clone(),
                title: non_blank(&parsed.feature_request.title),
                description: non_blank(&parsed.feature_request.description),
                timestamp: Utc::now().to_rfc3339(),
                conversation_id: id.to_string(),
            });
        }

        Ok(ChatOutcome {
            reply: parsed.reply,
            missing_feature: parsed.missing_feature,
            feature_request: parsed.feature_request,
        })
    }

    /// End a conversation, writing its final transcript.
    ///
    /// Returns whether a transcript was saved.
    pub async fn end(&self, conversation_id: &str) -> bool {
        let Some(record) = self.store.end(conversation_id) else {
            tracing::info!(conversation_id = %conversation_id, "End requested for unknown conversation");
            return false;
        };

        // Waits out a snapshot already being written
        let transcripts = self.store.transcripts();
        let _write = transcripts.lock(conversation_id).await;
        let written = transcripts.write_final(&record).await;
        transcripts.forget(conversation_id);

        match written {
            Ok(path) => {
                tracing::info!(
                    conversation_id = %conversation_id,
                    path = %path.display(),
                    "Final transcript saved"
                );
                true
            }
            Err(e) => {
                tracing::error!(conversation_id = %conversation_id, error = %e, "Final transcript failed");
                false
            }
        }
    }
}

fn to_llm_message(message: &ChatMessage) -> LlmMessage {
    match message.role {
        ChatRole::User => LlmMessage::user(message.content.clone()),
        ChatRole::Assistant => LlmMessage::assistant(message.content.clone()),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
