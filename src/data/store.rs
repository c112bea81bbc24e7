//! Persistence boundaries consumed by the auth and API layers
//!
//! Handlers and the OAuth callback only see these traits, so the SQLite
//! adapter can be swapped for a fake in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{Measurement, Session};
use crate::error::AppError;

/// Session persistence
///
/// Absence is reported as `Ok(None)`, never as an error. The store is
/// responsible for keeping at most one session per provider user id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Find the session linked to a Polar user id
    async fn find_by_provider_user_id(
        &self,
        provider_user_id: i64,
    ) -> Result<Option<Session>, AppError>;

    /// Find a session by its local id
    async fn find_by_id(&self, id: i64) -> Result<Option<Session>, AppError>;

    /// Create a new session
    ///
    /// # Errors
    /// Fails if a session for `provider_user_id` already exists
    async fn create(&self, provider_token: &str, provider_user_id: i64)
    -> Result<Session, AppError>;
}

/// Measurement persistence
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// All measurements of a session, oldest first
    async fn list_measurements(&self, session_id: i64) -> Result<Vec<Measurement>, AppError>;

    /// Record a measurement for a session
    async fn add_measurement(
        &self,
        session_id: i64,
        heart_rate: i64,
        measured_at: DateTime<Utc>,
    ) -> Result<Measurement, AppError>;
}
