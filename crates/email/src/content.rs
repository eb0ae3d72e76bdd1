//! Shared email content
//!
//! Canonical content generators for support notifications, used by both
//! production (SES) and mock email services.

use serde::{Deserialize, Serialize};

/// Everything support needs to follow up on a missing-feature report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRequestNotice {
    pub username: String,
    pub route: String,
    pub user_message: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub timestamp: String,
    pub conversation_id: String,
}

/// Subject line for a feature request notification.
pub fn feature_request_subject(notice: &FeatureRequestNotice) -> String {
    let title = notice
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("New request");
    format!("Snipr Feature Request: {}", title)
}

/// Plain-text body for a feature request notification.
pub fn feature_request_text(notice: &FeatureRequestNotice) -> String {
    format!(
        "A user asked for a feature that may not exist.\n\n\
        Username: {}\n\
        Route: {}\n\
        Message: {}\n\
        Timestamp: {}\n\
        Conversation ID: {}\n\n\
        Title: {}\n\
        Description: {}",
        notice.username,
        notice.route,
        notice.user_message,
        notice.timestamp,
        notice.conversation_id,
        notice.title.as_deref().unwrap_or(""),
        notice.description.as_deref().unwrap_or(""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> FeatureRequestNotice {
        FeatureRequestNotice {
            username: "@trader".to_string(),
            route: "/dashboard".to_string(),
            user_message: "Can I export my snipes?".to_string(),
            title: Some("CSV export".to_string()),
            description: Some("Export snipes as CSV".to_string()),
            timestamp: "2026-01-01T00:00:00".to_string(),
            conversation_id: "abc".to_string(),
        }
    }

    #[test]
    fn test_subject_uses_title() {
        assert_eq!(
            feature_request_subject(&notice()),
            "Snipr Feature Request: CSV export"
        );
    }

    #[test]
    fn test_subject_falls_back_when_title_blank() {
        let n = FeatureRequestNotice {
            title: Some("  ".to_string()),
            ..notice()
        };
        assert_eq!(
            feature_request_subject(&n),
            "Snipr Feature Request: New request"
        );
    }

    #[test]
    fn test_body_lists_context() {
        let body = feature_request_text(&notice());
        assert!(body.starts_with("A user asked for a feature that may not exist."));
        assert!(body.contains("Username: @trader"));
        assert!(body.contains("Route: /dashboard"));
        assert!(body.contains("Conversation ID: abc"));
        assert!(body.contains("Description: Export snipes as CSV"));
    }

    #[test]
    fn test_body_empty_optional_fields() {
        let n = FeatureRequestNotice {
            title: None,
            description: None,
            ..notice()
        };
        let body = feature_request_text(&n);
        assert!(body.contains("Title: \n"));
        assert!(body.ends_with("Description: "));
    }
}
