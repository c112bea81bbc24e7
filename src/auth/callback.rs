//! Polar OAuth callback
//!
//! Implements the OAuth 2.0 authorization code flow with Polar AccessLink:
//! exchange the code, find or create the session, register new users and
//! hand back a session token.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::token::SessionTokens;
use crate::AppState;
use crate::data::{Session, SessionStore};
use crate::error::AppError;
use crate::provider::{ProviderAccessToken, TokenExchanger, UserRegistrar};

/// Create authentication router
///
/// Routes:
/// - GET /oauth2_callback - OAuth callback
pub fn auth_router() -> Router<AppState> {
    Router::new().route("/oauth2_callback", get(oauth2_callback))
}

/// Drives the callback flow
///
/// `AwaitingCode → Exchanging → ResolvingSession → (RegisteringNewUser) →
/// IssuingToken`. Any step can fail and halts the flow.
pub struct AuthCallback {
    exchanger: Arc<dyn TokenExchanger>,
    registrar: Arc<dyn UserRegistrar>,
    sessions: Arc<dyn SessionStore>,
    tokens: SessionTokens,
}

impl AuthCallback {
    pub fn new(
        exchanger: Arc<dyn TokenExchanger>,
        registrar: Arc<dyn UserRegistrar>,
        sessions: Arc<dyn SessionStore>,
        tokens: SessionTokens,
    ) -> Self {
        Self {
            exchanger,
            registrar,
            sessions,
            tokens,
        }
    }

    /// Run the flow for one authorization code
    ///
    /// # Returns
    /// A signed session token
    ///
    /// # Errors
    /// - `BadRequest` if `code` is missing or empty; nothing is called
    /// - `Upstream`/`HttpClient` if the exchange fails
    /// - `RegistrationFailed` if a new user cannot be registered. The
    ///   session created just before is kept.
    /// - `Database` on store failures
    pub async fn complete(&self, code: Option<&str>) -> Result<String, AppError> {
        let code = code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

        let provider_token = self.exchanger.exchange(code).await?;
        let session = self.resolve_session(&provider_token).await?;

        let token = self.tokens.issue(&session)?;
        tracing::info!(session_id = session.id, "Session token issued");

        Ok(token)
    }

    async fn resolve_session(
        &self,
        provider_token: &ProviderAccessToken,
    ) -> Result<Session, AppError> {
        let provider_user_id = provider_token.provider_user_id;

        if let Some(session) = self
            .sessions
            .find_by_provider_user_id(provider_user_id)
            .await?
        {
            tracing::info!(
                session_id = session.id,
                provider_user_id,
                "Reusing existing session"
            );
            return Ok(session);
        }

        let session = self
            .sessions
            .create(&provider_token.value, provider_user_id)
            .await?;
        crate::metrics::SESSIONS_CREATED_TOTAL.inc();
        tracing::info!(session_id = session.id, provider_user_id, "Session created");

        if let Err(error) = self
            .registrar
            .register(session.id, &provider_token.value)
            .await
        {
            tracing::warn!(
                session_id = session.id,
                %error,
                "Provider registration failed; session kept unregistered"
            );
            return Err(error);
        }

        Ok(session)
    }
}

/// Query parameters from the Polar redirect
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    /// Authorization code
    code: Option<String>,
}

/// Body returned to the client
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionTokenResponse {
    pub token: String,
}

/// GET /oauth2_callback
async fn oauth2_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<SessionTokenResponse>, AppError> {
    let token = state.callback.complete(query.code.as_deref()).await?;
    Ok(Json(SessionTokenResponse { token }))
}
