//! Route definitions for Support domain API

use axum::{routing::post, Router};

use super::handlers::chat;
use super::middleware::SupportState;

/// Create all Support domain API routes
pub fn routes() -> Router<SupportState> {
    Router::new()
        .route("/api/support/chat", post(chat::send_message))
        .route("/api/support/chat/end", post(chat::end_chat))
}
