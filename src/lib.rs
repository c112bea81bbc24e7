//! actgate - session gateway for the Polar AccessLink API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - OAuth callback, session info                             │
//! │  - Measurements                                             │
//! │  - /proxy relay                                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Auth / Provider Layer                       │
//! │  - Session tokens (HS256)                                   │
//! │  - Code exchange, user registration, forwarding             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for session info, measurements and the relay
//! - `auth`: OAuth callback flow and session tokens
//! - `provider`: Polar AccessLink client
//! - `data`: Database layer
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod provider;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Every collaborator is wired once here and shared by reference.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Measurement storage
    pub measurements: Arc<dyn data::MeasurementStore>,

    /// Resolves bearer tokens to sessions
    pub verifier: Arc<auth::SessionVerifier>,

    /// OAuth callback flow
    pub callback: Arc<auth::AuthCallback>,

    /// Relay to the provider API
    pub proxy: Arc<provider::ForwardingProxy>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Build the outbound HTTP clients
    /// 3. Wire session tokens, callback flow and relay
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!("Database connected");

        // 2. Initialize HTTP clients
        // OAuth calls get a total deadline; the relay only bounds connect and
        // per-read waits so streamed bodies are not cut off.
        let timeout = std::time::Duration::from_secs(config.provider.timeout_seconds);
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("actgate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;
        let relay_client = provider::relay_client(timeout)?;

        // 3. Wire components
        let sessions: Arc<dyn data::SessionStore> = db.clone();
        let tokens = auth::SessionTokens::new(config.auth.token_secret.as_bytes());
        let provider_client = Arc::new(provider::ProviderClient::new(
            http_client,
            config.provider.clone(),
        ));

        let verifier = auth::SessionVerifier::new(tokens.clone(), sessions.clone());
        let callback = auth::AuthCallback::new(
            provider_client.clone(),
            provider_client,
            sessions,
            tokens,
        );
        let proxy = provider::ForwardingProxy::new(relay_client, &config.provider.api_base_url);

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            measurements: db.clone(),
            db,
            verifier: Arc::new(verifier),
            callback: Arc::new(callback),
            proxy: Arc::new(proxy),
        })
    }
}

/// Maximum accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .merge(api::session_router())
        .merge(api::measurements_router())
        .merge(api::proxy_router())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
