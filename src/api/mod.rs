//! Remote account API access.
//!
//! Every remote call in the crate goes through the [`Fetch`] trait;
//! [`ApiClient`] is the production implementation with a shared concurrency
//! gate and retry handling. Higher components never open connections
//! themselves.

mod client;
mod resource;

pub use client::ApiClient;
pub use resource::Resource;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::credentials::ApiKey;

/// Errors surfaced by a fetch once the client's internal retries are
/// exhausted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The credential was rejected. Never retried.
    #[error("unauthorized fetching {resource}: the API key was rejected")]
    Unauthorized { resource: String },

    /// The rate limit persisted through every backoff attempt.
    #[error("throttled fetching {resource} after {attempts} attempts")]
    Throttled { resource: String, attempts: u32 },

    /// Transport failure, timeout, or server error after retries.
    #[error("could not reach {resource}: {reason}")]
    Unreachable { resource: String, reason: String },

    /// The response could not be interpreted, or the request itself was
    /// rejected as invalid.
    #[error("malformed response for {resource}: {reason}")]
    Malformed { resource: String, reason: String },
}

/// Single seam for remote I/O.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch one resource, authorizing with `key` when given.
    async fn get(&self, resource: &Resource, key: Option<&ApiKey>) -> Result<Value, FetchError>;
}

/// Decode a fetched JSON value into its typed shape.
pub fn decode<T: DeserializeOwned>(resource: &Resource, value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|err| FetchError::Malformed {
        resource: resource.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_maps_shape_mismatch_to_malformed() {
        let value = json!({ "unexpected": true });
        let result: Result<Vec<u32>, _> = decode(&Resource::Wallet, value);

        match result {
            Err(FetchError::Malformed { resource, .. }) => {
                assert_eq!(resource, "account/wallet");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn decode_passes_through_matching_shapes() {
        let value = json!([1, 2, 3]);
        let decoded: Vec<u32> = decode(&Resource::Characters, value).unwrap();
        assert_eq!(decoded, vec![1, 2, 3]);
    }
}
