//! Provider wire types

use serde::{Deserialize, Deserializer};

/// Response of the Polar token endpoint
///
/// Transient: consumed within the callback request that produced it.
///
/// Polar sends `x_user_id` as an unsigned 64-bit integer. Sessions store it
/// as a SQLite INTEGER, so ids above `i64::MAX` are rejected at decode time
/// and the exchange reports a malformed token response.
#[derive(Clone, Deserialize)]
pub struct ProviderAccessToken {
    #[serde(rename = "access_token")]
    pub value: String,
    #[serde(rename = "token_type", default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(rename = "x_user_id", deserialize_with = "provider_user_id")]
    pub provider_user_id: i64,
}

/// Decode an unsigned provider id into the stored signed range
fn provider_user_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let id = u64::deserialize(deserializer)?;
    i64::try_from(id).map_err(|_| {
        serde::de::Error::custom(format!(
            "x_user_id {id} exceeds the supported maximum of {}",
            i64::MAX
        ))
    })
}

impl std::fmt::Debug for ProviderAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAccessToken")
            .field("value", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("provider_user_id", &self.provider_user_id)
            .finish()
    }
}
