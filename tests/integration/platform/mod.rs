//! Infrastructure routes and cross-cutting middleware

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use serde_json::json;
use tower::ServiceExt;

use crate::common::*;

mod test_infrastructure_routes {
    use super::*;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let app = SniprTestApp::new().await.unwrap();

        let resp = app
            .test_router()
            .oneshot(json_request(Method::GET, "/health", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "OK");
    }

    #[tokio::test]
    async fn test_root_banner() {
        let app = SniprTestApp::new().await.unwrap();

        let resp = app
            .test_router()
            .oneshot(json_request(Method::GET, "/", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "Snipr API v0.0.1-SNAPSHOT");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = SniprTestApp::new().await.unwrap();

        let resp = app
            .test_router()
            .oneshot(json_request(Method::GET, "/v1/teams", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

mod test_cors {
    use super::*;

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/support/chat")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_wildcard_allows_any_origin() {
        let app = SniprTestApp::new().await.unwrap();

        let resp = app
            .test_router()
            .oneshot(preflight("https://anywhere.example"))
            .await
            .unwrap();

        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_listed_origin_is_echoed_with_credentials() {
        let app = SniprTestApp::with_options(TestAppOptions {
            cors_allowed_origins: "https://snipr.app, https://beta.snipr.app".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let resp = app
            .test_router()
            .oneshot(preflight("https://beta.snipr.app"))
            .await
            .unwrap();

        let headers = resp.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://beta.snipr.app"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_allow_header() {
        let app = SniprTestApp::with_options(TestAppOptions {
            cors_allowed_origins: "https://snipr.app".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let resp = app
            .test_router()
            .oneshot(preflight("https://evil.example"))
            .await
            .unwrap();

        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}

mod test_body_limit {
    use super::*;

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = SniprTestApp::new().await.unwrap();
        let payload = serde_json::to_vec(&json!({ "message": "a".repeat(2 * 1024 * 1024) })).unwrap();

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/support/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, payload.len())
            .body(Body::from(payload))
            .unwrap();

        let resp = app.test_router().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(app.llm.request_count(), 0);
    }
}
