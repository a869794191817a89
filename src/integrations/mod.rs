// src/integrations/mod.rs
//
// External content API
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Returns metadata values; never touches entities or the database
// - "Not found" is data (FetchOutcome::not_found), never an error
// - Every failure of a call is a RemoteError covering the whole batch

pub mod youtube;

pub use youtube::client::YouTubeClient;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Category, ChannelMetadata, VideoMetadata};

/// Failure of one remote call. Never means "the entity does not exist".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Remote quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Failed to decode remote response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// No further calls can succeed today
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, RemoteError::QuotaExceeded(_))
    }
}

/// Result of one batched lookup: live records plus the requested ids the remote did not return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome<T> {
    pub found: Vec<T>,
    pub not_found: Vec<String>,
}

impl<T> FetchOutcome<T> {
    /// Split `requested` into found records and missing ids, keeping request order for the misses.
    pub fn partition(requested: &[String], found: Vec<T>, id_of: impl Fn(&T) -> &str) -> Self {
        let not_found = requested
            .iter()
            .filter(|id| !found.iter().any(|record| id_of(record) == id.as_str()))
            .cloned()
            .collect();
        Self { found, not_found }
    }
}

/// Batched access to the content API.
///
/// Implementations bound their own request time and retries; callers see
/// exactly one outcome per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_videos(&self, ids: &[String]) -> Result<FetchOutcome<VideoMetadata>, RemoteError>;

    async fn fetch_channels(
        &self,
        ids: &[String],
    ) -> Result<FetchOutcome<ChannelMetadata>, RemoteError>;

    async fn fetch_video_categories(&self, region_code: &str) -> Result<Vec<Category>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_lists_missing_ids_in_request_order() {
        let requested = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let found = vec!["b".to_string()];

        let outcome = FetchOutcome::partition(&requested, found, |s| s.as_str());

        assert_eq!(outcome.found, vec!["b"]);
        assert_eq!(outcome.not_found, vec!["a", "c"]);
    }

    #[test]
    fn test_only_quota_errors_are_exhaustion() {
        assert!(RemoteError::QuotaExceeded("daily".into()).is_quota_exhausted());
        assert!(!RemoteError::Transport("reset".into()).is_quota_exhausted());
        assert!(!RemoteError::Http {
            status: 500,
            message: "backend".into()
        }
        .is_quota_exhausted());
    }
}
