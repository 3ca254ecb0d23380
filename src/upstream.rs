//! Shared HTTP plumbing for the upstream providers
//!
//! Both providers speak the same error-code contract, so a single client
//! maps transport failures and non-success statuses onto the
//! [`SkycastError`] taxonomy. Orchestrators branch on the returned variant
//! instead of inspecting raw statuses. Nothing here retries: a failed call
//! surfaces immediately.

use crate::error::SkycastError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client with the service-wide request timeout applied
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    /// Build a client enforcing `timeout` on every outbound call
    pub fn new(timeout: Duration) -> Result<Self, SkycastError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skycast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SkycastError::unexpected(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// GET `url` and decode the JSON body
    ///
    /// Provider statuses map onto the error taxonomy: 401 to
    /// [`SkycastError::Unauthorized`], 404 to [`SkycastError::NotFound`],
    /// 429 to [`SkycastError::RateLimited`], any other non-success to
    /// [`SkycastError::UpstreamInvalid`]. Timeouts and connection failures
    /// become [`SkycastError::Network`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SkycastError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Network error: {e}");
            SkycastError::network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    tracing::error!("Provider rejected API key (HTTP 401)");
                    SkycastError::Unauthorized
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    tracing::error!("Provider rate limit exceeded (HTTP 429)");
                    SkycastError::RateLimited
                }
                StatusCode::NOT_FOUND => SkycastError::not_found("No match for query"),
                _ => {
                    tracing::error!("Provider returned HTTP {status}");
                    SkycastError::upstream_invalid(format!(
                        "Provider returned HTTP {}",
                        status.as_u16()
                    ))
                }
            });
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to decode provider response: {e}");
            SkycastError::upstream_invalid(format!("Failed to decode provider response: {e}"))
        })
    }
}
