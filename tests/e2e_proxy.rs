//! E2E tests for the /proxy relay

mod common;

use common::TestServer;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_proxy_relays_with_provider_token() {
    let server = TestServer::new().await;
    let session = server.create_session(99, "T1").await;
    let token = server.token_for(&session);

    Mock::given(method("GET"))
        .and(path("/v3/users/me"))
        .and(header("authorization", "Bearer T1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "polar-user-id": 99,
            "first-name": "Ada"
        })))
        .expect(1)
        .mount(&server.provider)
        .await;

    let response = server
        .client
        .get(server.url("/proxy/users/me"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "polar-user-id": 99, "first-name": "Ada" }));
}

#[tokio::test]
async fn test_proxy_passes_upstream_errors_through() {
    let server = TestServer::new().await;
    let session = server.create_session(99, "T1").await;
    let token = server.token_for(&session);

    Mock::given(method("GET"))
        .and(path("/v3/users/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such resource"))
        .expect(1)
        .mount(&server.provider)
        .await;

    let response = server
        .client
        .get(server.url("/proxy/users/missing"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "no such resource");
}

#[tokio::test]
async fn test_proxy_passes_upstream_unauthorized_through() {
    let server = TestServer::new().await;
    let session = server.create_session(99, "expired-token").await;
    let token = server.token_for(&session);

    Mock::given(method("GET"))
        .and(path("/v3/exercises"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server.provider)
        .await;

    let response = server
        .client
        .get(server.url("/proxy/exercises"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(response.text().await.unwrap(), "token expired");
}

#[tokio::test]
async fn test_proxy_relays_every_method_as_get() {
    let server = TestServer::new().await;
    let session = server.create_session(99, "T1").await;
    let token = server.token_for(&session);

    Mock::given(method("GET"))
        .and(path("/v3/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&server.provider)
        .await;

    for request in [
        server.client.post(server.url("/proxy/users/me")),
        server.client.delete(server.url("/proxy/users/me")),
    ] {
        let response = request
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let requests = server.provider.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn test_proxy_forwards_query_string() {
    let server = TestServer::new().await;
    let session = server.create_session(99, "T1").await;
    let token = server.token_for(&session);

    Mock::given(method("GET"))
        .and(path("/v3/exercises"))
        .and(query_param("samples", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server.provider)
        .await;

    let response = server
        .client
        .get(server.url("/proxy/exercises?samples=true"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_proxy_requires_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/proxy/users/me"))
        .header("Authorization", "Bearer garbage")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(server.provider_request_count().await, 0);
}

/// Send a request line verbatim; reqwest would normalize dot segments
async fn raw_get_status(server: &TestServer, target: &str, token: &str) -> u16 {
    let host = server.addr.trim_start_matches("http://");
    let mut stream = TcpStream::connect(host).await.unwrap();
    let request = format!(
        "GET {target} HTTP/1.1\r\nHost: {host}\r\nAuthorization: Bearer {token}\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    response
        .split_whitespace()
        .nth(1)
        .and_then(|status| status.parse().ok())
        .unwrap()
}

#[tokio::test]
async fn test_proxy_rejects_paths_escaping_api_root() {
    let server = TestServer::new().await;
    let session = server.create_session(99, "T1").await;
    let token = server.token_for(&session);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("leaked"))
        .expect(0)
        .mount(&server.provider)
        .await;

    for target in [
        "/proxy/../v2/oauth2/token",
        "/proxy/%2e%2e/v2/oauth2/token",
        "/proxy/users/../../v2/oauth2/token",
        "/proxy/.%2E/.%2E/v2/oauth2/token",
    ] {
        let status = raw_get_status(&server, target, &token).await;
        assert_eq!(status, 400, "{target}");
    }

    assert_eq!(server.provider_request_count().await, 0);
}
