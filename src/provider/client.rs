//! Polar AccessLink OAuth and registration calls
//!
//! Both calls are made exactly once per callback. An authorization code
//! is single-use, so neither is retried.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;

use super::types::ProviderAccessToken;
use crate::config::ProviderConfig;
use crate::error::AppError;
use crate::metrics::observe_upstream;

/// Exchanges an OAuth2 authorization code for a provider access token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, code: &str) -> Result<ProviderAccessToken, AppError>;
}

/// Registers a local session with the provider
///
/// "Already registered" counts as success.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRegistrar: Send + Sync {
    async fn register(&self, session_id: i64, provider_token: &str) -> Result<(), AppError>;
}

/// HTTP client for the Polar OAuth and user endpoints
#[derive(Clone)]
pub struct ProviderClient {
    http_client: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Create new provider client
    ///
    /// `http_client` carries the outbound timeout.
    pub fn new(http_client: reqwest::Client, config: ProviderConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }
}

#[async_trait]
impl TokenExchanger for ProviderClient {
    /// POST the code to the token endpoint with HTTP Basic client credentials
    ///
    /// # Errors
    /// - `HttpClient` on transport failure
    /// - `Upstream` on a non-2xx status or a body that is not a token response
    async fn exchange(&self, code: &str) -> Result<ProviderAccessToken, AppError> {
        let started = Instant::now();

        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", "authorization_code"), ("code", code)])
            .send()
            .await
            .inspect_err(|_| {
                observe_upstream("token_exchange", "transport_error", started.elapsed())
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            observe_upstream("token_exchange", "http_error", started.elapsed());
            tracing::warn!(status = status.as_u16(), "Token exchange rejected by provider");
            return Err(AppError::Upstream {
                message: "Token exchange failed".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let token = serde_json::from_str::<ProviderAccessToken>(&body).map_err(|e| {
            observe_upstream("token_exchange", "malformed", started.elapsed());
            AppError::Upstream {
                message: format!("Malformed token response: {}", e),
                status: status.as_u16(),
                body: body.clone(),
            }
        })?;

        observe_upstream("token_exchange", "success", started.elapsed());
        tracing::debug!(
            provider_user_id = token.provider_user_id,
            expires_in = token.expires_in,
            "Authorization code exchanged"
        );

        Ok(token)
    }
}

#[async_trait]
impl UserRegistrar for ProviderClient {
    /// POST `{"member-id": "<session id>"}` to the users endpoint
    ///
    /// # Errors
    /// - `HttpClient` on transport failure
    /// - `RegistrationFailed` on any non-2xx status other than 409
    async fn register(&self, session_id: i64, provider_token: &str) -> Result<(), AppError> {
        let started = Instant::now();

        let response = self
            .http_client
            .post(self.config.users_url())
            .bearer_auth(provider_token)
            .header(ACCEPT, "application/json")
            .json(&serde_json::json!({ "member-id": session_id.to_string() }))
            .send()
            .await
            .inspect_err(|_| {
                observe_upstream("register_user", "transport_error", started.elapsed())
            })?;

        let status = response.status();

        if status == StatusCode::CONFLICT {
            observe_upstream("register_user", "conflict", started.elapsed());
            tracing::info!(session_id, "User already registered with provider");
            return Ok(());
        }

        if !status.is_success() {
            observe_upstream("register_user", "http_error", started.elapsed());
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read registration error body");
                String::new()
            });
            return Err(AppError::RegistrationFailed {
                status: status.as_u16(),
                body,
            });
        }

        observe_upstream("register_user", "success", started.elapsed());
        tracing::info!(session_id, "User registered with provider");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ProviderClient {
        ProviderClient::new(
            reqwest::Client::new(),
            ProviderConfig {
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                token_url: format!("{}/v2/oauth2/token", server.uri()),
                api_base_url: format!("{}/v3", server.uri()),
                timeout_seconds: 5,
            },
        )
    }

    #[tokio::test]
    async fn exchange_posts_form_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/oauth2/token"))
            .and(header(
                "authorization",
                "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=",
            ))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=ABC123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "T1",
                "token_type": "bearer",
                "expires_in": 3600,
                "x_user_id": 42
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = client_for(&server).exchange("ABC123").await.unwrap();

        assert_eq!(token.value, "T1");
        assert_eq!(token.provider_user_id, 42);
    }

    #[tokio::test]
    async fn exchange_non_success_preserves_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .expect(1)
            .mount(&server)
            .await;

        let error = client_for(&server).exchange("used-code").await.unwrap_err();

        assert!(matches!(
            error,
            AppError::Upstream { status: 400, ref body, .. } if body == "invalid_grant"
        ));
    }

    #[tokio::test]
    async fn exchange_malformed_body_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let error = client_for(&server).exchange("ABC123").await.unwrap_err();

        assert!(matches!(error, AppError::Upstream { status: 200, .. }));
    }

    #[tokio::test]
    async fn exchange_transport_failure_is_http_client_error() {
        let client = ProviderClient::new(
            reqwest::Client::new(),
            ProviderConfig {
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                token_url: "http://127.0.0.1:1/v2/oauth2/token".to_string(),
                api_base_url: "http://127.0.0.1:1/v3".to_string(),
                timeout_seconds: 5,
            },
        );

        let error = client.exchange("ABC123").await.unwrap_err();

        assert!(matches!(error, AppError::HttpClient(_)));
    }

    #[tokio::test]
    async fn register_sends_member_id_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/users"))
            .and(header("authorization", "Bearer T1"))
            .and(body_json(serde_json::json!({ "member-id": "7" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).register(7, "T1").await.unwrap();
    }

    #[tokio::test]
    async fn register_conflict_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/users"))
            .respond_with(ResponseTemplate::new(409).set_body_string("already registered"))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).register(7, "T1").await.is_ok());
    }

    #[tokio::test]
    async fn register_failure_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/users"))
            .respond_with(ResponseTemplate::new(403).set_body_string("consent missing"))
            .expect(1)
            .mount(&server)
            .await;

        let error = client_for(&server).register(7, "T1").await.unwrap_err();

        assert!(matches!(
            error,
            AppError::RegistrationFailed { status: 403, ref body } if body == "consent missing"
        ));
    }
}
