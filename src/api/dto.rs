//! Data Transfer Objects
//!
//! JSON shapes exchanged with clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{Measurement, Session};

/// Public view of a session
///
/// Only the Polar user id is exposed; the provider token never leaves
/// the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub polar_id: i64,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            polar_id: session.provider_user_id,
        }
    }
}

/// A heart rate measurement as sent and received by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementView {
    /// Beats per minute
    pub heart_rate: i64,
    pub measured_at: DateTime<Utc>,
}

impl From<Measurement> for MeasurementView {
    fn from(measurement: Measurement) -> Self {
        Self {
            heart_rate: measurement.heart_rate,
            measured_at: measurement.measured_at,
        }
    }
}
