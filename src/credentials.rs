//! Account API key handling and permission validation.
//!
//! Key *entry* (prompting, storage) belongs to the embedding application;
//! this module only models the credential and checks that the remote API
//! accepts it with the permissions a capture needs.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::api::{decode, Fetch, FetchError, Resource};

/// Token permissions a full capture requires.
pub const REQUIRED_PERMISSIONS: [&str; 3] = ["wallet", "inventories", "characters"];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid API key: {reason}")]
pub struct ApiKeyError {
    reason: &'static str,
}

/// Account API key.
///
/// Redacted in debug output; the raw value only leaves this type rendered
/// as an `Authorization` header.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ApiKeyError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ApiKeyError {
                reason: "key is empty",
            });
        }
        if key.chars().any(char::is_whitespace) {
            return Err(ApiKeyError {
                reason: "key contains whitespace",
            });
        }
        Ok(Self(SecretString::from(key)))
    }

    pub(crate) fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([redacted])")
    }
}

impl FromStr for ApiKey {
    type Err = ApiKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("API key is missing required permissions: {}", missing.join(", "))]
    MissingPermissions { missing: Vec<String> },
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    permissions: Vec<String>,
}

/// Check that `key` is accepted by the remote API and grants every
/// permission a capture needs.
///
/// An invalid or expired key surfaces as [`FetchError::Unauthorized`]; a
/// valid key lacking scopes reports the missing permission names so the
/// user knows what to fix when re-issuing the key.
pub async fn verify_key(fetcher: &dyn Fetch, key: &ApiKey) -> Result<(), CredentialError> {
    let value = fetcher.get(&Resource::TokenInfo, Some(key)).await?;
    let info: TokenInfo = decode(&Resource::TokenInfo, value)?;

    let missing: Vec<String> = REQUIRED_PERMISSIONS
        .iter()
        .filter(|needed| !info.permissions.iter().any(|have| have == *needed))
        .map(|needed| needed.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CredentialError::MissingPermissions { missing })
    }
}
