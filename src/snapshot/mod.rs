//! Snapshot capture: concurrent fan-out over every storage location of an
//! account, joined into one immutable [`Snapshot`](crate::models::Snapshot).

mod builder;
mod wire;

pub use builder::SnapshotBuilder;

use std::fmt;

use thiserror::Error;

use crate::api::{FetchError, Resource};

/// One resource that could not be retrieved during a build.
#[derive(Debug, Clone)]
pub struct FailedFetch {
    pub resource: Resource,
    pub error: FetchError,
}

impl fmt::Display for FailedFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.resource, self.error)
    }
}

fn summarize(failed: &[FailedFetch]) -> String {
    failed
        .iter()
        .map(|fetch| fetch.resource.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Snapshot build failure. A snapshot is all-or-nothing: any failed
/// resource aborts the whole capture.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// At least one resource fetch failed; the error lists exactly which
    /// ones so the caller can decide between retrying the capture and
    /// re-entering credentials.
    #[error("snapshot capture failed, {} resource(s) unavailable: {}", failed.len(), summarize(failed))]
    PartialFailure { failed: Vec<FailedFetch> },
}

impl BuildError {
    /// The resources that could not be fetched.
    pub fn failed_resources(&self) -> impl Iterator<Item = &Resource> {
        let BuildError::PartialFailure { failed } = self;
        failed.iter().map(|fetch| &fetch.resource)
    }

    /// True when any failure was a credential rejection; retrying the
    /// capture cannot succeed until the key is replaced.
    pub fn has_auth_failure(&self) -> bool {
        let BuildError::PartialFailure { failed } = self;
        failed
            .iter()
            .any(|fetch| matches!(fetch.error, FetchError::Unauthorized { .. }))
    }
}
