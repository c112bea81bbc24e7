//! Data models
//!
//! Rust structs representing database entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Session
// =============================================================================

/// One authenticated linkage between a client and a Polar account
///
/// Created once per provider identity and never mutated afterwards.
/// `provider_token` is a secret: it is never serialized to clients and
/// is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Session {
    /// Local session id, also the subject of the session token
    pub id: i64,
    /// Polar user id (`x_user_id` from the token exchange)
    pub provider_user_id: i64,
    /// Polar access token used for relayed calls
    pub provider_token: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("provider_user_id", &self.provider_user_id)
            .field("provider_token", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

// =============================================================================
// Measurement
// =============================================================================

/// A heart rate sample recorded by a session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Measurement {
    pub id: i64,
    pub session_id: i64,
    /// Beats per minute
    pub heart_rate: i64,
    pub measured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_debug_redacts_provider_token() {
        let session = Session {
            id: 7,
            provider_user_id: 99,
            provider_token: "T1-secret".to_string(),
            created_at: Utc::now(),
        };

        let rendered = format!("{:?}", session);
        assert!(rendered.contains("provider_user_id: 99"));
        assert!(!rendered.contains("T1-secret"));
    }
}
