//! Polar OAuth authentication
//!
//! Handles:
//! - Polar OAuth callback flow
//! - Session token issuance and verification
//! - Session extraction for protected routes

mod callback;
mod middleware;
pub mod token;

pub use callback::{AuthCallback, SessionTokenResponse, auth_router};
pub use middleware::{CurrentSession, SessionVerifier};
pub use token::{SessionTokens, bearer_token};
