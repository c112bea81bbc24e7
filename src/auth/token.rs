//! Session tokens
//!
//! HS256 JWTs whose only trusted claim is `sub`, the local session id.
//! Tokens carry no expiry and stay valid until the secret is rotated.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::data::Session;
use crate::error::AppError;

/// Claim set of a session token
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Session id, decimal
    sub: String,
    /// Issued at (seconds since epoch), informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
}

/// Issues and verifies session tokens with a process-wide secret
///
/// Built once at startup; the secret is never re-read.
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionTokens {
    /// Create from the shared signing secret
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a token whose subject is `session.id`
    pub fn issue(&self, session: &Session) -> Result<String, AppError> {
        let claims = SessionClaims {
            sub: session.id.to_string(),
            iat: Some(chrono::Utc::now().timestamp()),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |e| AppError::Internal(anyhow::anyhow!("Failed to sign session token: {}", e)),
        )?;

        crate::metrics::SESSION_TOKENS_ISSUED_TOTAL.inc();
        Ok(token)
    }

    /// Verify a token and return the session id it names
    ///
    /// Any failure (bad encoding, signature, algorithm, or subject) is
    /// `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                AppError::Unauthorized
            })?;

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value
///
/// The scheme is matched case-insensitively; surrounding whitespace is
/// ignored.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    const SCHEME: &str = "bearer";

    let value = header_value.trim();
    let (scheme, rest) = value.split_at_checked(SCHEME.len())?;
    if !scheme.eq_ignore_ascii_case(SCHEME) || !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}
