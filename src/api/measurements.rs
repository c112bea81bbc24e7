//! Measurement endpoints
//!
//! Heart rate samples recorded by the client, scoped to its session.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use super::dto::MeasurementView;
use crate::AppState;
use crate::auth::CurrentSession;
use crate::error::AppError;

/// Accepted heart rate range, beats per minute
const HEART_RATE_RANGE: std::ops::RangeInclusive<i64> = 1..=300;

/// Create measurements router
///
/// Routes:
/// - GET /measurements - list the session's measurements
/// - POST /measurements - record a measurement
pub fn measurements_router() -> Router<AppState> {
    Router::new().route("/measurements", get(list_measurements).post(add_measurement))
}

/// GET /measurements
async fn list_measurements(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<MeasurementView>>, AppError> {
    let measurements = state.measurements.list_measurements(session.id).await?;

    Ok(Json(measurements.into_iter().map(MeasurementView::from).collect()))
}

/// POST /measurements
async fn add_measurement(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(input): Json<MeasurementView>,
) -> Result<(StatusCode, Json<MeasurementView>), AppError> {
    if !HEART_RATE_RANGE.contains(&input.heart_rate) {
        return Err(AppError::BadRequest(format!(
            "heart_rate must be between {} and {}",
            HEART_RATE_RANGE.start(),
            HEART_RATE_RANGE.end()
        )));
    }

    let measurement = state
        .measurements
        .add_measurement(session.id, input.heart_rate, input.measured_at)
        .await?;

    tracing::debug!(
        session_id = session.id,
        measurement_id = measurement.id,
        "Measurement recorded"
    );

    Ok((StatusCode::CREATED, Json(MeasurementView::from(measurement))))
}
