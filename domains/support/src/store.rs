//! In-memory conversation store with idle snapshots
//!
//! Conversations live in a `DashMap` keyed by conversation id. Every append
//! (re)arms a per-conversation idle watcher; once a conversation has been
//! quiet for the whole timeout its transcript is snapshotted to disk once.
//! Records left untouched for the retention window are then dropped from
//! memory, their snapshot already on disk.
//!
//! Records are cloned out of the map before any `.await`; no map guard is
//! held across a transcript write.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::domain::entities::{ChatMessage, ChatRole, ConversationRecord};
use crate::transcripts::TranscriptWriter;

/// Idle period after which a snapshot is written
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Idle periods a conversation stays in memory before it is evicted
const RETENTION_IDLE_PERIODS: u32 = 120;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Conversation {0} does not exist")]
    NotFound(String),
}

impl From<StoreError> for snipr_common::Error {
    fn from(err: StoreError) -> Self {
        snipr_common::Error::NotFound(err.to_string())
    }
}

/// What the idle watcher does after one check
#[derive(Debug, PartialEq)]
enum IdleStep {
    Wait(Duration),
    Done,
}

struct StoreInner {
    conversations: DashMap<String, ConversationRecord>,
    timers: DashMap<String, JoinHandle<()>>,
    idle_timeout: Duration,
    retention: Duration,
    transcripts: TranscriptWriter,
}

/// Shared handle to the conversation store
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<StoreInner>,
}

impl ConversationStore {
    pub fn new(transcripts: TranscriptWriter, idle_timeout: Duration) -> Self {
        Self::with_retention(transcripts, idle_timeout, idle_timeout * RETENTION_IDLE_PERIODS)
    }

    /// Store that evicts conversations idle for longer than `retention`
    pub fn with_retention(
        transcripts: TranscriptWriter,
        idle_timeout: Duration,
        retention: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                conversations: DashMap::new(),
                timers: DashMap::new(),
                idle_timeout,
                retention: retention.max(idle_timeout),
                transcripts,
            }),
        }
    }

    pub fn transcripts(&self) -> &TranscriptWriter {
        &self.inner.transcripts
    }

    /// Fetch the conversation, creating it for `username` on first contact
    pub fn get_or_create(&self, conversation_id: &str, username: &str) -> ConversationRecord {
        self.inner
            .conversations
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                tracing::info!(conversation_id = %conversation_id, username = %username, "Conversation started");
                ConversationRecord::new(conversation_id, username)
            })
            .value()
            .clone()
    }

    /// Cloned copy of the conversation, if present
    pub fn get(&self, conversation_id: &str) -> Option<ConversationRecord> {
        self.inner
            .conversations
            .get(conversation_id)
            .map(|r| r.value().clone())
    }

    /// Append a message and re-arm the idle watcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn append_message(
        &self,
        conversation_id: &str,
        role: ChatRole,
        content: &str,
        route: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut record = self
            .inner
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::NotFound(conversation_id.to_string()))?;
        record.push_message(role, content, route, Utc::now());

        // Armed under the record guard so the newest append owns the watcher
        self.arm_idle_timer(conversation_id);
        drop(record);

        tracing::debug!(conversation_id = %conversation_id, role = %role, "Message appended");
        Ok(())
    }

    /// Bump the unknown-answer counter, returning the new value
    pub fn increment_unknown(&self, conversation_id: &str) -> Result<u32, StoreError> {
        let mut record = self
            .inner
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::NotFound(conversation_id.to_string()))?;
        record.unknown_count += 1;
        Ok(record.unknown_count)
    }

    pub fn unknown_count(&self, conversation_id: &str) -> Result<u32, StoreError> {
        self.inner
            .conversations
            .get(conversation_id)
            .map(|r| r.unknown_count)
            .ok_or_else(|| StoreError::NotFound(conversation_id.to_string()))
    }

    /// Retained messages, oldest first
    pub fn recent_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        self.inner
            .conversations
            .get(conversation_id)
            .map(|r| r.messages.iter().cloned().collect())
            .ok_or_else(|| StoreError::NotFound(conversation_id.to_string()))
    }

    /// Cancel the idle watcher and remove the conversation
    pub fn end(&self, conversation_id: &str) -> Option<ConversationRecord> {
        if let Some((_, timer)) = self.inner.timers.remove(conversation_id) {
            timer.abort();
        }
        self.inner
            .conversations
            .remove(conversation_id)
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.inner.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.conversations.is_empty()
    }

    /// Live idle watchers
    pub fn timer_count(&self) -> usize {
        self.inner.timers.len()
    }

    fn arm_idle_timer(&self, conversation_id: &str) {
        let inner = Arc::clone(&self.inner);
        let id = conversation_id.to_string();

        let timer = tokio::spawn(async move {
            let mut wait = inner.idle_timeout;
            loop {
                tokio::time::sleep(wait).await;
                // Detached: aborting the watcher must not cut a write short
                match tokio::spawn(Arc::clone(&inner).idle_step(id.clone())).await {
                    Ok(IdleStep::Wait(next)) => wait = next,
                    Ok(IdleStep::Done) | Err(_) => break,
                }
            }

            let finished = tokio::task::id();
            inner.timers.remove_if(&id, |_, timer| timer.id() == finished);
        });

        if let Some(previous) = self.inner.timers.insert(conversation_id.to_string(), timer) {
            previous.abort();
        }
    }
}

impl StoreInner {
    /// Check the conversation's current activity stamp under its transcript
    /// lock. Snapshots once per idle period and evicts after `retention`.
    async fn idle_step(self: Arc<Self>, conversation_id: String) -> IdleStep {
        let _write = self.transcripts.lock(&conversation_id).await;

        let (snapshot, idle_for) = {
            let Some(mut record) = self.conversations.get_mut(&conversation_id) else {
                return IdleStep::Done;
            };
            let stamp = record.last_updated_at;
            let idle_for = (Utc::now() - stamp).to_std().unwrap_or_default();

            if idle_for < self.idle_timeout {
                return IdleStep::Wait(self.idle_timeout - idle_for);
            }

            if record.last_snapshot_at == Some(stamp) {
                if idle_for < self.retention {
                    return IdleStep::Wait(self.retention - idle_for);
                }
                drop(record);
                self.conversations
                    .remove_if(&conversation_id, |_, r| r.last_updated_at == stamp);
                self.transcripts.forget(&conversation_id);
                tracing::info!(conversation_id = %conversation_id, "Idle conversation evicted");
                return IdleStep::Done;
            }

            record.last_snapshot_at = Some(stamp);
            (record.value().clone(), idle_for)
        };

        match self.transcripts.write_snapshot(&snapshot).await {
            Ok(path) => tracing::info!(
                conversation_id = %conversation_id,
                path = %path.display(),
                "Idle snapshot saved"
            ),
            Err(e) => tracing::error!(
                conversation_id = %conversation_id,
                error = %e,
                "Idle snapshot failed"
            ),
        }

        IdleStep::Wait(self.retention.saturating_sub(idle_for))
    }
}
