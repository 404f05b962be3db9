use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, StatusCode, Url};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::{Fetch, FetchError, Resource};
use crate::config::FetcherConfig;
use crate::credentials::ApiKey;

const DEFAULT_BASE_URL: &str = "https://api.guildwars2.com/v2";
const USER_AGENT: &str = concat!("gw2-ledger/", env!("CARGO_PKG_VERSION"));

/// Rate-limited account API client.
///
/// A single semaphore bounds in-flight requests across every component that
/// shares this client. Throttling responses are retried with exponential
/// backoff; transport failures are retried without delay; credential
/// rejections are surfaced immediately.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    gate: Arc<Semaphore>,
    throttle_retries: u32,
    throttle_backoff: std::time::Duration,
    transport_retries: u32,
}

impl ApiClient {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");

        Ok(Self {
            http,
            base_url,
            gate: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            throttle_retries: config.throttle_retries,
            throttle_backoff: config.throttle_backoff,
            transport_retries: config.transport_retries,
        })
    }

    /// Point the client at a different API root (used against mock servers).
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        let url = Url::parse(base).context("Invalid base URL")?;
        anyhow::ensure!(
            !url.cannot_be_a_base(),
            "Base URL must support path segments: {base}"
        );
        self.base_url = url;
        Ok(self)
    }

    async fn request_once(
        &self,
        resource: &Resource,
        url: &Url,
        key: Option<&ApiKey>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json");
        if let Some(key) = key {
            request = request.header(header::AUTHORIZATION, key.bearer_header());
        }
        debug!(resource = %resource, "issuing request");
        request.send().await
    }
}

#[async_trait]
impl Fetch for ApiClient {
    async fn get(&self, resource: &Resource, key: Option<&ApiKey>) -> Result<Value, FetchError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| FetchError::Unreachable {
                resource: resource.to_string(),
                reason: "request gate closed".to_string(),
            })?;

        let url = resource.url(&self.base_url);
        let mut throttle_attempts: u32 = 0;
        let mut transport_attempts: u32 = 0;

        loop {
            let response = match self.request_once(resource, &url, key).await {
                Ok(response) => response,
                Err(err) if transport_attempts < self.transport_retries => {
                    transport_attempts += 1;
                    debug!(
                        resource = %resource,
                        attempt = transport_attempts,
                        error = %err,
                        "transport failure, retrying"
                    );
                    continue;
                }
                Err(err) => {
                    return Err(FetchError::Unreachable {
                        resource: resource.to_string(),
                        reason: err.to_string(),
                    });
                }
            };

            let status = response.status();

            // 206 is how the bulk id endpoints report a partially known id set.
            if status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT {
                return response
                    .json::<Value>()
                    .await
                    .map_err(|err| FetchError::Malformed {
                        resource: resource.to_string(),
                        reason: err.to_string(),
                    });
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(FetchError::Unauthorized {
                    resource: resource.to_string(),
                });
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if throttle_attempts >= self.throttle_retries {
                    return Err(FetchError::Throttled {
                        resource: resource.to_string(),
                        attempts: throttle_attempts + 1,
                    });
                }
                // The permit is held across the backoff so a throttled
                // request keeps occupying its concurrency slot.
                let delay = self
                    .throttle_backoff
                    .saturating_mul(2u32.saturating_pow(throttle_attempts));
                throttle_attempts += 1;
                warn!(
                    resource = %resource,
                    attempt = throttle_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if status.is_server_error() {
                if transport_attempts < self.transport_retries {
                    transport_attempts += 1;
                    debug!(
                        resource = %resource,
                        attempt = transport_attempts,
                        %status,
                        "server error, retrying"
                    );
                    continue;
                }
                return Err(FetchError::Unreachable {
                    resource: resource.to_string(),
                    reason: format!("server error: {status}"),
                });
            }

            // Remaining 4xx: the request itself was rejected; retrying the
            // same request cannot succeed.
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Malformed {
                resource: resource.to_string(),
                reason: format!("{status}: {body}"),
            });
        }
    }
}
