//! Support domain state

use crate::service::SupportChatService;

/// Application state for the Support domain
#[derive(Clone)]
pub struct SupportState {
    pub chat: SupportChatService,
}
