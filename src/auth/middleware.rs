//! Session resolution for protected routes
//!
//! Turns an `Authorization` header into a stored session.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use super::token::{SessionTokens, bearer_token};
use crate::AppState;
use crate::data::{Session, SessionStore};
use crate::error::AppError;

/// Resolves inbound session tokens to stored sessions
///
/// A missing or malformed header, a bad signature, an unparsable subject
/// and an unknown session id all collapse into `Unauthorized`.
#[derive(Clone)]
pub struct SessionVerifier {
    tokens: SessionTokens,
    sessions: Arc<dyn SessionStore>,
}

impl SessionVerifier {
    pub fn new(tokens: SessionTokens, sessions: Arc<dyn SessionStore>) -> Self {
        Self { tokens, sessions }
    }

    /// Resolve a raw `Authorization` header value
    ///
    /// # Errors
    /// `Unauthorized` for any token problem; a store failure propagates
    /// as an internal error.
    pub async fn resolve(&self, authorization: Option<&str>) -> Result<Session, AppError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AppError::Unauthorized)?;

        let session_id = self.tokens.verify(token)?;

        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(session_id, "Session token names an unknown session");
                AppError::Unauthorized
            })
    }
}

/// Extractor for the current authenticated session
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentSession(session): CurrentSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", session.provider_user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(CurrentSession(session));
        }

        let state = AppState::from_ref(state);
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let session = state.verifier.resolve(authorization).await?;
        parts.extensions.insert(session.clone());

        Ok(CurrentSession(session))
    }
}
