//! Support domain: in-app support chat, conversation store, transcripts,
//! feature-request escalation

pub mod api;
pub mod domain;
pub mod knowledge;
pub mod notifier;
pub mod service;
pub mod store;
pub mod transcripts;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{ChatMessage, ChatRole, ConversationRecord, RouteVisit, MAX_MESSAGES};
pub use domain::reply::{FeatureRequest, SupportReply};

pub use knowledge::KnowledgeBase;
pub use notifier::FeatureRequestNotifier;
pub use service::{ChatOutcome, ChatTurn, SupportChatService, SupportConfig};
pub use store::{ConversationStore, StoreError};
pub use transcripts::{TranscriptError, TranscriptWriter};

// Re-export API types
pub use api::routes;
pub use api::SupportState;
