//! Common test utilities for E2E tests

#![allow(dead_code)]

use actgate::auth::SessionTokens;
use actgate::data::{Session, SessionStore};
use actgate::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::MockServer;

pub const TOKEN_SECRET: &str = "test-secret-key-32-bytes-long!!!";

/// Test server instance backed by a mock Polar provider
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub provider: MockServer,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let provider = MockServer::start().await;

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                token_secret: TOKEN_SECRET.to_string(),
            },
            provider: config::ProviderConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                token_url: format!("{}/v2/oauth2/token", provider.uri()),
                api_base_url: format!("{}/v3", provider.uri()),
                timeout_seconds: 5,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        actgate::metrics::init_metrics();
        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = actgate::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: format!("http://{}", addr),
            state,
            provider,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a session directly in the store
    pub async fn create_session(&self, provider_user_id: i64, provider_token: &str) -> Session {
        self.state
            .db
            .create(provider_token, provider_user_id)
            .await
            .unwrap()
    }

    /// Issue a session token the way the callback does
    pub fn token_for(&self, session: &Session) -> String {
        SessionTokens::new(TOKEN_SECRET.as_bytes())
            .issue(session)
            .unwrap()
    }

    /// Session id named by a token, if it verifies
    pub fn session_id_of(&self, token: &str) -> i64 {
        SessionTokens::new(TOKEN_SECRET.as_bytes())
            .verify(token)
            .unwrap()
    }

    /// Number of requests the mock provider has seen
    pub async fn provider_request_count(&self) -> usize {
        self.provider
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
