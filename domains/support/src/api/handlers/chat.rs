//! Support chat API handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use snipr_common::{Error, Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::SupportState;
use crate::service::{ChatOutcome, ChatTurn};

const GUEST_USERNAME: &str = "guest";

/// Request for sending a chat message
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub username: Option<String>,
    /// App route the user is on
    pub route: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    pub conversation_id: Option<String>,
}

/// Chat reply plus the conversation it belongs to
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub outcome: ChatOutcome,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
}

/// Request for ending a conversation
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndChatRequest {
    pub username: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "conversationId is required"))]
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct EndChatResponse {
    pub success: bool,
    pub saved: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Send a message to the support assistant
pub async fn send_message(
    State(state): State<SupportState>,
    ValidatedJson(req): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(Error::Validation("Message is required".to_string()));
    }

    let turn = ChatTurn {
        conversation_id: non_blank(req.conversation_id)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        username: non_blank(req.username).unwrap_or_else(|| GUEST_USERNAME.to_string()),
        route: non_blank(req.route),
        message: message.to_string(),
    };

    let outcome = state.chat.chat(&turn).await?;

    Ok(Json(ChatResponse {
        outcome,
        conversation_id: turn.conversation_id,
    }))
}

/// End a conversation and save its transcript
pub async fn end_chat(
    State(state): State<SupportState>,
    ValidatedJson(req): ValidatedJson<EndChatRequest>,
) -> Result<Json<EndChatResponse>> {
    let conversation_id = req.conversation_id.trim();
    if conversation_id.is_empty() {
        return Err(Error::Validation("conversationId is required".to_string()));
    }

    tracing::info!(
        conversation_id = %conversation_id,
        username = req.username.as_deref().unwrap_or(GUEST_USERNAME),
        "Ending support conversation"
    );

    let saved = state.chat.end(conversation_id).await;

    Ok(Json(EndChatResponse {
        success: true,
        saved,
    }))
}
