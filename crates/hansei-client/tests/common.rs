//! Common test utilities for hansei-client integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use hansei_client::KokuClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token handed out by the mock `token-auth/` endpoint.
pub const TEST_TOKEN: &str = "0123456789abcdef";

/// Expected `Authorization` header value after login.
pub fn token_header() -> String {
    format!("Token {TEST_TOKEN}")
}

/// API path on the mock server.
pub fn api_path(endpoint: &str) -> String {
    format!("/api/v1/{endpoint}")
}

/// A mock Koku server and an unauthenticated client pointed at it.
pub async fn mock_koku() -> (MockServer, KokuClient) {
    let server = MockServer::start().await;
    let client = KokuClient::new(format!("{}/api/v1/", server.uri()))
        .expect("Failed to build client");
    (server, client)
}

/// A mock Koku server that accepts any login, and a client logged in to it.
pub async fn logged_in_koku() -> (MockServer, KokuClient) {
    let (server, mut client) = mock_koku().await;

    Mock::given(method("POST"))
        .and(path(api_path("token-auth/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": TEST_TOKEN})))
        .mount(&server)
        .await;

    client
        .login("test_customer", "redhat")
        .await
        .expect("Login against mock server failed");
    (server, client)
}
