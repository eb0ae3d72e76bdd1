//! Conversation entities for the Support domain

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages kept per conversation; older ones are dropped first
pub const MAX_MESSAGES: usize = 50;

/// Chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    #[mutants::skip] // Log formatting only
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub ts: DateTime<Utc>,
}

/// App screen the user was on when sending a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteVisit {
    pub route: String,
    pub ts: DateTime<Utc>,
}

/// In-memory state of one support conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub username: String,
    pub messages: VecDeque<ChatMessage>,
    /// Never filled in; kept for the transcript format
    pub summary: String,
    pub route_history: Vec<RouteVisit>,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub unknown_count: u32,
    pub ended_at: Option<DateTime<Utc>>,
    /// `last_updated_at` value of the idle period that was last snapshotted
    pub last_snapshot_at: Option<DateTime<Utc>>,
}

impl ConversationRecord {
    pub fn new(conversation_id: impl Into<String>, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            username: username.into(),
            messages: VecDeque::with_capacity(MAX_MESSAGES),
            summary: String::new(),
            route_history: Vec::new(),
            started_at: now,
            last_updated_at: now,
            unknown_count: 0,
            ended_at: None,
            last_snapshot_at: None,
        }
    }

    /// Append a message, evicting the oldest past [`MAX_MESSAGES`].
    ///
    /// A non-empty `route` is also recorded in the route history.
    pub fn push_message(
        &mut self,
        role: ChatRole,
        content: impl Into<String>,
        route: Option<&str>,
        ts: DateTime<Utc>,
    ) {
        if self.messages.len() == MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(ChatMessage {
            role,
            content: content.into(),
            ts,
        });

        if let Some(route) = route.filter(|r| !r.trim().is_empty()) {
            self.route_history.push(RouteVisit {
                route: route.to_string(),
                ts,
            });
        }

        self.last_updated_at = ts;
    }
}
