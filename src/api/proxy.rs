//! Provider relay endpoint

use axum::{
    Router,
    extract::State,
    http::{Method, Uri},
    response::Response,
    routing::any,
};

use crate::AppState;
use crate::auth::CurrentSession;
use crate::error::AppError;
use crate::provider::PROXY_PREFIX;

/// Create proxy router
///
/// Routes:
/// - ANY /proxy, /proxy/* - relayed to the AccessLink API root
pub fn proxy_router() -> Router<AppState> {
    Router::new()
        .route(PROXY_PREFIX, any(relay))
        .route(&format!("{PROXY_PREFIX}/*path"), any(relay))
}

/// ANY /proxy/*path
async fn relay(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    method: Method,
    uri: Uri,
) -> Result<Response, AppError> {
    state.proxy.forward(&session, &uri, &method).await
}
