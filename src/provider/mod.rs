//! Polar AccessLink provider integration
//!
//! Handles:
//! - OAuth2 authorization-code exchange
//! - User registration
//! - Credential-injecting request forwarding

mod client;
mod proxy;
mod types;

pub use client::{ProviderClient, TokenExchanger, UserRegistrar};
pub use proxy::{ForwardingProxy, PROXY_PREFIX, relay_client};
pub use types::ProviderAccessToken;

#[cfg(test)]
pub use client::{MockTokenExchanger, MockUserRegistrar};
