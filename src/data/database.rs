//! SQLite database operations
//!
//! All database access goes through this module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use super::store::{MeasurementStore, SessionStore};
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Number of persisted sessions
    pub async fn count_sessions(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[async_trait]
impl SessionStore for Database {
    async fn find_by_provider_user_id(
        &self,
        provider_user_id: i64,
    ) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, provider_user_id, provider_token, created_at FROM sessions WHERE provider_user_id = ?",
        )
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, provider_user_id, provider_token, created_at FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn create(
        &self,
        provider_token: &str,
        provider_user_id: i64,
    ) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (provider_user_id, provider_token, created_at)
            VALUES (?, ?, ?)
            RETURNING id, provider_user_id, provider_token, created_at
            "#,
        )
        .bind(provider_user_id)
        .bind(provider_token)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }
}

// =============================================================================
// Measurements
// =============================================================================

#[async_trait]
impl MeasurementStore for Database {
    async fn list_measurements(&self, session_id: i64) -> Result<Vec<Measurement>, AppError> {
        let measurements = sqlx::query_as::<_, Measurement>(
            r#"
            SELECT id, session_id, heart_rate, measured_at
            FROM measurements
            WHERE session_id = ?
            ORDER BY measured_at ASC, id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(measurements)
    }

    async fn add_measurement(
        &self,
        session_id: i64,
        heart_rate: i64,
        measured_at: DateTime<Utc>,
    ) -> Result<Measurement, AppError> {
        let measurement = sqlx::query_as::<_, Measurement>(
            r#"
            INSERT INTO measurements (session_id, heart_rate, measured_at)
            VALUES (?, ?, ?)
            RETURNING id, session_id, heart_rate, measured_at
            "#,
        )
        .bind(session_id)
        .bind(heart_rate)
        .bind(measured_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(measurement)
    }
}
