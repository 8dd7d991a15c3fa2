//! End-to-end tests for authentication
//!
//! Tests login, logout, and session token handling.

mod common;

use common::{TestClient, TestServer, TEST_PASS, TEST_USER};
use reqwest::StatusCode;

#[tokio::test]
async fn test_login_success_sets_cookie_and_returns_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    // The cookie jar now carries the session; the home endpoint echoes it
    let response = client.get_stats().await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats: serde_json::Value = response.json().await.unwrap();
    assert_eq!(stats["session_token"].as_str(), Some(token.as_str()));
}

#[tokio::test]
async fn test_login_with_wrong_password_is_forbidden() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, "not-the-password").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_with_unknown_user_is_forbidden() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login("nobody", TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_works_in_authorization_header() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, TEST_PASS).await;
    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    // A fresh client without the cookie, using only the header
    let bare = reqwest::Client::new();
    let response = bare
        .get(format!("{}/v1/library/artists", server.base_url))
        .header("Authorization", token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.logout().await;
    assert_eq!(response.status(), StatusCode::OK);

    // The token is gone server-side; protected routes reject the client
    let response = client.get_artists().await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_protected_routes_require_authentication() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_artists().await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client.sync_library().await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client.get_favorites(None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_home_works_without_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_stats().await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats: serde_json::Value = response.json().await.unwrap();
    assert!(stats["session_token"].is_null());
    assert!(stats["uptime"].is_string());
}
