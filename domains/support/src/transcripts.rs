//! Conversation transcript files
//!
//! One pretty-printed JSON file per conversation at
//! `<root>/@<username>/<conversationId>.json`. Idle snapshots and the final
//! save overwrite the same file, so writers for one conversation take its
//! lock first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{ChatMessage, ConversationRecord, RouteVisit};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Transcript I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transcript serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// On-disk transcript layout
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptFile<'a> {
    conversation_id: &'a str,
    username: String,
    messages: Vec<&'a ChatMessage>,
    summary: &'a str,
    route_history: &'a [RouteVisit],
    started_at: DateTime<Utc>,
    last_updated_at: DateTime<Utc>,
    unknown_count: u32,
    ended_at: Option<DateTime<Utc>>,
    last_snapshot_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_snapshot: Option<bool>,
    last_saved_at: DateTime<Utc>,
    is_final: bool,
}

/// Writes transcripts under a root directory
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    root: PathBuf,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl TranscriptWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Exclusive right to write `conversation_id`'s transcript
    pub async fn lock(&self, conversation_id: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(
            self.locks
                .entry(conversation_id.to_string())
                .or_default()
                .value(),
        );
        lock.lock_owned().await
    }

    /// Drop the lock of a conversation that is gone from memory
    pub fn forget(&self, conversation_id: &str) {
        self.locks.remove(conversation_id);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the transcript for `conversation_id` owned by `username`
    pub fn path_for(&self, username: &str, conversation_id: &str) -> PathBuf {
        let file_stem = sanitize_segment(conversation_id).unwrap_or_else(|| "unknown".to_string());
        self.root
            .join(user_dir_name(username))
            .join(format!("{}.json", file_stem))
    }

    /// Write an idle snapshot
    pub async fn write_snapshot(
        &self,
        record: &ConversationRecord,
    ) -> Result<PathBuf, TranscriptError> {
        let now = Utc::now();
        let file = build_file(record, now, Some(now), false);
        self.write(record, &file).await
    }

    /// Write the final transcript, filling `endedAt` when it is missing
    pub async fn write_final(&self, record: &ConversationRecord) -> Result<PathBuf, TranscriptError> {
        let now = Utc::now();
        let mut file = build_file(record, now, None, true);
        file.ended_at.get_or_insert(now);
        self.write(record, &file).await
    }

    async fn write(
        &self,
        record: &ConversationRecord,
        file: &TranscriptFile<'_>,
    ) -> Result<PathBuf, TranscriptError> {
        let path = self.path_for(&record.username, &record.conversation_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(file)?;
        tokio::fs::write(&path, json).await?;

        tracing::debug!(path = %path.display(), is_final = file.is_final, "Transcript written");
        Ok(path)
    }
}

fn build_file(
    record: &ConversationRecord,
    saved_at: DateTime<Utc>,
    snapshot_at: Option<DateTime<Utc>>,
    is_final: bool,
) -> TranscriptFile<'_> {
    TranscriptFile {
        conversation_id: &record.conversation_id,
        username: user_dir_name(&record.username),
        messages: record.messages.iter().collect(),
        summary: &record.summary,
        route_history: &record.route_history,
        started_at: record.started_at,
        last_updated_at: record.last_updated_at,
        unknown_count: record.unknown_count,
        ended_at: record.ended_at,
        last_snapshot_at: record.last_snapshot_at,
        snapshot_at,
        is_snapshot: snapshot_at.map(|_| true),
        last_saved_at: saved_at,
        is_final,
    }
}

/// `@`-prefixed directory name for a user; blank names become `@guest`
pub fn user_dir_name(username: &str) -> String {
    let name = username.trim();
    let name = name.strip_prefix('@').unwrap_or(name);
    let name = sanitize_segment(name).unwrap_or_else(|| "guest".to_string());
    format!("@{}", name)
}

/// Keep a client-supplied value from escaping its directory
fn sanitize_segment(value: &str) -> Option<String> {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('.').to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}
