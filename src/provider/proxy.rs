//! Credential-injecting relay to the AccessLink API
//!
//! The relay is transparent: upstream status codes, including errors,
//! are handed back unchanged and the body is streamed without buffering.
//! Only a failure of the relay itself becomes an `AppError`.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::response::Response;
use futures::StreamExt;
use http::{Method, Uri};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::data::Session;
use crate::error::AppError;
use crate::metrics::{PROXY_RETRIES_TOTAL, observe_upstream};

/// Routing prefix stripped from inbound paths before relaying
pub const PROXY_PREFIX: &str = "/proxy";

/// Total attempts for a relayed GET, first try included
const MAX_ATTEMPTS: u32 = 2;

/// Build the HTTP client used for relaying
///
/// `timeout` bounds connecting and every single read, not the whole
/// exchange, so a long download keeps streaming as long as bytes flow.
pub fn relay_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .user_agent(concat!("actgate/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(e.into()))
}

/// Relays authenticated requests to the provider's versioned API root
#[derive(Clone)]
pub struct ForwardingProxy {
    http_client: reqwest::Client,
    api_base_url: String,
    /// Path of `api_base_url` without a trailing slash, e.g. "/v3"
    base_path: String,
}

impl ForwardingProxy {
    /// Create new forwarding proxy
    ///
    /// # Arguments
    /// * `http_client` - Shared client, carries the outbound timeouts
    /// * `api_base_url` - Versioned API root, e.g. "https://www.polaraccesslink.com/v3"
    pub fn new(http_client: reqwest::Client, api_base_url: &str) -> Self {
        let api_base_url = api_base_url.trim_end_matches('/').to_string();
        let base_path = Url::parse(&api_base_url)
            .map(|url| url.path().trim_end_matches('/').to_string())
            .unwrap_or_default();

        Self {
            http_client,
            api_base_url,
            base_path,
        }
    }

    /// Map an inbound path and query onto the upstream URL
    ///
    /// `/proxy/users/me?x=1` becomes `<api root>/users/me?x=1`.
    ///
    /// # Errors
    /// `BadRequest` if the path does not resolve to a location under the
    /// API root, e.g. through `..` segments, raw or percent-encoded.
    pub fn upstream_url(&self, request_path: &str, query: Option<&str>) -> Result<Url, AppError> {
        let rest = request_path
            .strip_prefix(PROXY_PREFIX)
            .unwrap_or(request_path);

        let mut joined = format!("{}{}", self.api_base_url, rest);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            joined.push('?');
            joined.push_str(query);
        }

        let url = Url::parse(&joined)
            .map_err(|_| AppError::BadRequest("Invalid relay path".to_string()))?;

        // Url::parse has already resolved dot segments
        let path = url.path();
        let inside = path == self.base_path
            || path
                .strip_prefix(&self.base_path)
                .is_some_and(|tail| tail.starts_with('/'));
        if !inside {
            tracing::warn!(path = request_path, "Relay path escapes the API root");
            return Err(AppError::BadRequest(
                "Relay path must stay under the API root".to_string(),
            ));
        }

        Ok(url)
    }

    /// Forward a request on behalf of `session`
    ///
    /// The upstream call is always a GET, whatever the inbound method.
    ///
    /// # Errors
    /// - `BadRequest` if the path leaves the API root; nothing is sent
    /// - `HttpClient` when the transport fails
    ///
    /// Upstream non-2xx statuses are not errors.
    pub async fn forward(
        &self,
        session: &Session,
        uri: &Uri,
        method: &Method,
    ) -> Result<Response, AppError> {
        let url = self.upstream_url(uri.path(), uri.query())?;

        if method != Method::GET {
            tracing::debug!(%method, "Relaying inbound request upstream as GET");
        }

        let upstream = self.send_with_retry(&url, &session.provider_token).await?;
        let status = upstream.status();

        tracing::info!(
            session_id = session.id,
            path = uri.path(),
            status = status.as_u16(),
            "Relayed request to provider"
        );

        let mut builder = Response::builder().status(status);
        if let Some(content_type) = upstream.headers().get(CONTENT_TYPE) {
            builder = builder.header(CONTENT_TYPE, content_type.clone());
        }

        let stream = upstream
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));

        builder.body(Body::from_stream(stream)).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to build relay response: {}", e))
        })
    }

    /// GET with one retry on connect failure or timeout
    ///
    /// Nothing has been received when either happens, so the retry cannot
    /// duplicate a response.
    async fn send_with_retry(
        &self,
        url: &Url,
        provider_token: &str,
    ) -> Result<reqwest::Response, AppError> {
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let result = self
                .http_client
                .get(url.clone())
                .bearer_auth(provider_token)
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json")
                .send()
                .await;

            match result {
                Ok(response) => {
                    let outcome = if response.status().is_success() {
                        "success"
                    } else {
                        "http_status"
                    };
                    observe_upstream("proxy", outcome, started.elapsed());
                    return Ok(response);
                }
                Err(error)
                    if attempt < MAX_ATTEMPTS && (error.is_connect() || error.is_timeout()) =>
                {
                    observe_upstream("proxy", "retry", started.elapsed());
                    PROXY_RETRIES_TOTAL.inc();
                    tracing::warn!(%error, attempt, "Relay attempt failed, retrying once");
                    attempt += 1;
                }
                Err(error) => {
                    observe_upstream("proxy", "transport_error", started.elapsed());
                    tracing::warn!(%error, attempt, "Relay request failed");
                    return Err(error.into());
                }
            }
        }
    }
}
