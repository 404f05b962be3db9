use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

fn default_max_in_flight() -> usize {
    8
}

/// Default per-request timeout (15 seconds).
fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_throttle_retries() -> u32 {
    3
}

/// Default base backoff after a throttling response (500 ms, doubled per
/// attempt).
fn default_throttle_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_transport_retries() -> u32 {
    2
}

/// Remote fetch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Maximum number of simultaneously in-flight requests. The remote API
    /// enforces burst and sustained rate limits; this cap applies across
    /// every component of the engine.
    pub max_in_flight: usize,

    /// Per-request timeout. A timed-out request is retried like any other
    /// transport failure.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,

    /// How many times a throttled request is retried before surfacing
    /// `FetchError::Throttled`.
    pub throttle_retries: u32,

    /// Base delay before retrying a throttled request; doubles on each
    /// further throttling response.
    #[serde(
        default = "default_throttle_backoff",
        deserialize_with = "deserialize_duration"
    )]
    pub throttle_backoff: Duration,

    /// How many times a transport failure is retried (without delay) before
    /// surfacing `FetchError::Unreachable`.
    pub transport_retries: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            request_timeout: default_request_timeout(),
            throttle_retries: default_throttle_retries(),
            throttle_backoff: default_throttle_backoff(),
            transport_retries: default_transport_retries(),
        }
    }
}

/// The bulk price endpoint accepts at most this many ids per request.
pub const MAX_PRICE_BATCH: usize = 200;

fn default_price_batch() -> usize {
    MAX_PRICE_BATCH
}

/// Price lookup tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    /// Ids per bulk price request. Clamped to `1..=MAX_PRICE_BATCH` by the
    /// resolver.
    pub batch_size: usize,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            batch_size: default_price_batch(),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Remote fetch settings.
    pub fetcher: FetcherConfig,

    /// Price lookup settings.
    pub prices: PriceConfig,
}

impl EngineConfig {
    /// Parse a configuration from TOML. Absent fields keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse engine configuration")
    }
}
