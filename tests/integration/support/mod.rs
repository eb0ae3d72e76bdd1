//! Support chat endpoints: `/api/support/chat` and `/api/support/chat/end`

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::common::*;

const CHAT: &str = "/api/support/chat";
const END: &str = "/api/support/chat/end";

async fn send(app: &SniprTestApp, body: Value) -> (StatusCode, Value) {
    let resp = app
        .test_router()
        .oneshot(json_request(Method::POST, CHAT, Some(body)))
        .await
        .unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

async fn end(app: &SniprTestApp, conversation_id: &str) -> (StatusCode, Value) {
    let resp = app
        .test_router()
        .oneshot(json_request(
            Method::POST,
            END,
            Some(json!({ "conversationId": conversation_id })),
        ))
        .await
        .unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

mod test_send_message {
    use super::*;

    #[tokio::test]
    async fn test_empty_message_returns_400() {
        let app = SniprTestApp::new().await.unwrap();

        let (status, body) = send(&app, json!({ "message": "   " })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(app.llm.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_message_returns_400() {
        let app = SniprTestApp::new().await.unwrap();

        let (status, _) = send(&app, json!({ "username": "alice" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plain_reply_assigns_conversation_id() {
        let app = SniprTestApp::new().await.unwrap();
        app.llm.push_reply("Open the dashboard and paste a profile link.");

        let (status, body) = send(&app, json!({ "message": "How do I analyze someone?" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Open the dashboard and paste a profile link.");
        assert_eq!(body["missing_feature"], false);
        assert!(!body["conversationId"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conversation_history_is_carried_between_turns() {
        let app = SniprTestApp::new().await.unwrap();
        app.llm.push_reply("First answer.");
        app.llm.push_reply("Second answer.");

        let (_, first) = send(
            &app,
            json!({ "message": "hello", "conversationId": "conv-history" }),
        )
        .await;
        assert_eq!(first["conversationId"], "conv-history");

        send(
            &app,
            json!({ "message": "and then?", "conversationId": "conv-history" }),
        )
        .await;

        let requests = app.llm.requests();
        assert_eq!(requests.len(), 2);
        // user, assistant, user
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[0].content, "hello");
        assert_eq!(requests[1].messages[1].content, "First answer.");
        assert_eq!(requests[1].model, "test-support");
        assert!(requests[1].system_prompt.is_some());
    }

    #[tokio::test]
    async fn test_structured_reply_triggers_feature_request_email() {
        let app = SniprTestApp::new().await.unwrap();
        app.llm.push_reply(
            json!({
                "reply": "Exporting reports isn't available yet.",
                "missing_feature": true,
                "feature_request": {
                    "title": "CSV export",
                    "description": "Download snipes as CSV"
                }
            })
            .to_string(),
        );

        let (status, body) = send(
            &app,
            json!({
                "message": "Can I export to CSV?",
                "username": "alice",
                "route": "/dashboard"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Exporting reports isn't available yet.");
        assert_eq!(body["missing_feature"], true);
        assert_eq!(body["feature_request"]["title"], "CSV export");

        // The notification is sent off the request path
        let mut sent = Vec::new();
        for _ in 0..50 {
            sent = app.email.get_emails_for_recipient(NOTIFY_TO);
            if !sent.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_unknown_answers_escalate_to_support_email() {
        let app = SniprTestApp::new().await.unwrap();
        app.llm.push_reply("That feature does not exist.");
        app.llm.push_reply("Sorry, that is not available.");

        let (_, first) = send(&app, json!({ "message": "dark mode?", "conversationId": "c-esc" })).await;
        assert!(!first["reply"].as_str().unwrap().contains(SUPPORT_EMAIL));

        let (_, second) = send(&app, json!({ "message": "really?", "conversationId": "c-esc" })).await;
        assert!(second["reply"].as_str().unwrap().contains(SUPPORT_EMAIL));
    }

    #[tokio::test]
    async fn test_llm_failure_returns_apology() {
        let app = SniprTestApp::new().await.unwrap();
        app.llm.push_failure("upstream down");

        let (status, body) = send(&app, json!({ "message": "hi" })).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["reply"]
            .as_str()
            .unwrap()
            .contains("trouble reaching the AI service"));
        assert_eq!(body["missing_feature"], false);
    }

    #[tokio::test]
    async fn test_missing_llm_returns_misconfiguration_reply() {
        let app = SniprTestApp::with_options(TestAppOptions {
            with_llm: false,
            ..Default::default()
        })
        .await
        .unwrap();

        let (status, body) = send(&app, json!({ "message": "hi" })).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["reply"]
            .as_str()
            .unwrap()
            .starts_with("Server misconfiguration"));
    }
}

mod test_end_chat {
    use super::*;

    #[tokio::test]
    async fn test_end_writes_final_transcript() {
        let app = SniprTestApp::new().await.unwrap();
        app.llm.push_reply("Hi there.");
        send(
            &app,
            json!({ "message": "hello", "username": "alice", "conversationId": "conv-end" }),
        )
        .await;

        let (status, body) = end(&app, "conv-end").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "saved": true }));

        let path = app.chat_logs.path().join("@alice").join("conv-end.json");
        let transcript: Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(transcript["isFinal"], true);
        assert_eq!(transcript["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_end_unknown_conversation_saves_nothing() {
        let app = SniprTestApp::new().await.unwrap();

        let (status, body) = end(&app, "never-started").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "saved": false }));
    }

    #[tokio::test]
    async fn test_end_twice_saves_once() {
        let app = SniprTestApp::new().await.unwrap();
        app.llm.push_reply("ok");
        send(&app, json!({ "message": "hello", "conversationId": "conv-twice" })).await;

        let (_, first) = end(&app, "conv-twice").await;
        let (_, second) = end(&app, "conv-twice").await;

        assert_eq!(first["saved"], true);
        assert_eq!(second["saved"], false);
    }

    #[tokio::test]
    async fn test_end_requires_conversation_id() {
        let app = SniprTestApp::new().await.unwrap();

        let (status, _) = end(&app, "").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod test_idle_snapshot {
    use super::*;

    #[tokio::test]
    async fn test_idle_conversation_is_snapshotted() {
        let app = SniprTestApp::with_options(TestAppOptions {
            idle_timeout: Duration::from_millis(100),
            ..Default::default()
        })
        .await
        .unwrap();
        app.llm.push_reply("Hi.");

        send(
            &app,
            json!({ "message": "hello", "username": "bob", "conversationId": "conv-idle" }),
        )
        .await;

        tokio::time::sleep(Duration::from_millis(400)).await;

        let path = app.chat_logs.path().join("@bob").join("conv-idle.json");
        let transcript: Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(transcript["isSnapshot"], true);
        assert_eq!(transcript["isFinal"], false);
    }
}
