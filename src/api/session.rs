//! Session info endpoint

use axum::{Json, Router, routing::get};

use super::dto::SessionView;
use crate::AppState;
use crate::auth::CurrentSession;

/// Create session router
///
/// Routes:
/// - GET /info - Polar id of the current session
pub fn session_router() -> Router<AppState> {
    Router::new().route("/info", get(session_info))
}

/// GET /info
async fn session_info(CurrentSession(session): CurrentSession) -> Json<SessionView> {
    Json(SessionView::from(&session))
}
