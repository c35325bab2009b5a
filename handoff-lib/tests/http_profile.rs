//! Integration tests for the HTTP profile service against a mock API.
//!
//! ```bash
//! cargo test -p handoff-lib --features http-client --test http_profile
//! ```

#![cfg(feature = "http-client")]

use std::sync::Arc;

use handoff_lib::profile::{HttpProfileService, ProfileService};
use handoff_lib::test_utils::{
    assert_invoked_once_with, registered_client, CompletionProbe, MockPeer,
};
use handoff_lib::{HandoffError, StatusCode};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

async fn service(server: &MockServer) -> HttpProfileService {
    HttpProfileService::with_base_url(server.uri(), 5).unwrap()
}

#[tokio::test]
async fn test_user_info_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/userinfo"))
        .and(query_param("openid", "u1"))
        .and(query_param("access_token", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "openid": "u1",
            "nickname": "Ada",
            "sex": 2,
            "headimgurl": "https://img.example/ada.png",
            "privilege": []
        })))
        .mount(&server)
        .await;

    let profile = service(&server).await.user_info("u1", "t1").await.unwrap();
    assert_eq!(profile.open_id, "u1");
    assert_eq!(profile.nickname.as_deref(), Some("Ada"));
    assert_eq!(
        profile.head_img_url.as_deref(),
        Some("https://img.example/ada.png")
    );
}

#[tokio::test]
async fn test_api_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 40003,
            "errmsg": "invalid openid"
        })))
        .mount(&server)
        .await;

    let err = service(&server)
        .await
        .user_info("bogus", "t1")
        .await
        .unwrap_err();
    assert!(matches!(err, HandoffError::Profile(ref msg) if msg.contains("40003")));
    assert_eq!(err.status(), StatusCode::Unknown);
}

#[tokio::test]
async fn test_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/userinfo"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = service(&server)
        .await
        .user_info("u1", "t1")
        .await
        .unwrap_err();
    assert!(matches!(err, HandoffError::Profile(ref msg) if msg.contains("503")));
}

#[tokio::test]
async fn test_fetch_user_info_through_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "openid": "u1",
            "nickname": "Ada",
            "headimgurl": "https://img.example/ada.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = registered_client(Arc::new(MockPeer::new()))
        .with_profile_service(Arc::new(service(&server).await));
    let probe = CompletionProbe::new();

    client
        .fetch_user_info("u1", "t1", probe.user_info_fn())
        .await;

    let call = assert_invoked_once_with(&probe, StatusCode::Success);
    assert_eq!(call.first.as_deref(), Some("Ada"));
}
