// src/integrations/youtube/client.rs
//
// YouTube Data API client
//
// ARCHITECTURE:
// - REST client over videos.list / channels.list / videoCategories.list
// - Handles API key, rate limiting, error classification
// - Maps wire JSON → metadata values (NO domain mutation)
// - Used by EnrichmentService and CatalogSeeder through RemoteSource
//
// CRITICAL RULES:
// - A missing item in a list response is "not found", never an error
// - Quota exhaustion is reported distinctly so the run can stop
// - No retries here; one call, one outcome

use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::models::{CategoryItem, ChannelItem, ErrorEnvelope, ListResponse, VideoItem};
use crate::config::AppConfig;
use crate::domain::{Category, ChannelMetadata, VideoMetadata};
use crate::error::{AppError, AppResult};
use crate::integrations::{FetchOutcome, RemoteError, RemoteSource};

/// The API accepts at most this many ids per list call
pub const MAX_IDS_PER_CALL: usize = 50;

const VIDEO_PARTS: &str = "snippet,contentDetails,statistics,status,topicDetails";
const CHANNEL_PARTS: &str = "snippet,statistics,topicDetails";

/// Rate limiter state
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// YouTube Data API client
pub struct YouTubeClient {
    base_url: String,
    api_key: String,
    http_client: Client,
    rate_limiter: Mutex<RateLimiter>,
}

impl YouTubeClient {
    pub fn new(
        api_key: String,
        base_url: String,
        request_interval: Duration,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http_client,
            rate_limiter: Mutex::new(RateLimiter::new(request_interval)),
        })
    }

    /// Build a client from configuration. Fails when no API key is configured.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "No API key configured (set api_key or YOUTUBE_API_KEY)".to_string(),
                )
            })?;

        Self::new(
            api_key,
            config.api_base_url.clone(),
            Duration::from_millis(config.request_interval_ms),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    // ========================================================================
    // INTERNAL: request execution
    // ========================================================================

    async fn get_list<T>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<T>, RemoteError>
    where
        T: DeserializeOwned,
    {
        self.rate_limiter.lock().await.wait_if_needed().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} ({:?})", url, query);

        let response = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let list: ListResponse<T> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        Ok(list.items)
    }
}

/// Map a non-2xx response to a RemoteError, singling out quota exhaustion.
fn classify_error(status: StatusCode, body: &str) -> RemoteError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.is_quota_error() => {
            RemoteError::QuotaExceeded(envelope.error.message)
        }
        Ok(envelope) => RemoteError::Http {
            status: status.as_u16(),
            message: envelope.error.message,
        },
        Err(_) => RemoteError::Http {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        },
    }
}

fn check_batch_size(ids: &[String]) -> Result<(), RemoteError> {
    if ids.len() > MAX_IDS_PER_CALL {
        return Err(RemoteError::Transport(format!(
            "Refusing to request {} ids in one call (max {})",
            ids.len(),
            MAX_IDS_PER_CALL
        )));
    }
    Ok(())
}

#[async_trait]
impl RemoteSource for YouTubeClient {
    async fn fetch_videos(&self, ids: &[String]) -> Result<FetchOutcome<VideoMetadata>, RemoteError> {
        check_batch_size(ids)?;
        if ids.is_empty() {
            return Ok(FetchOutcome {
                found: Vec::new(),
                not_found: Vec::new(),
            });
        }

        let joined = ids.join(",");
        let items: Vec<VideoItem> = self
            .get_list("videos", &[("part", VIDEO_PARTS), ("id", joined.as_str())])
            .await?;

        let found: Vec<VideoMetadata> = items.into_iter().map(VideoItem::into_metadata).collect();
        Ok(FetchOutcome::partition(ids, found, |v| v.video_id.as_str()))
    }

    async fn fetch_channels(
        &self,
        ids: &[String],
    ) -> Result<FetchOutcome<ChannelMetadata>, RemoteError> {
        check_batch_size(ids)?;
        if ids.is_empty() {
            return Ok(FetchOutcome {
                found: Vec::new(),
                not_found: Vec::new(),
            });
        }

        let joined = ids.join(",");
        let items: Vec<ChannelItem> = self
            .get_list("channels", &[("part", CHANNEL_PARTS), ("id", joined.as_str())])
            .await?;

        let found: Vec<ChannelMetadata> =
            items.into_iter().map(ChannelItem::into_metadata).collect();
        Ok(FetchOutcome::partition(ids, found, |c| c.channel_id.as_str()))
    }

    async fn fetch_video_categories(&self, region_code: &str) -> Result<Vec<Category>, RemoteError> {
        let items: Vec<CategoryItem> = self
            .get_list(
                "videoCategories",
                &[("part", "snippet"), ("regionCode", region_code)],
            )
            .await?;

        Ok(items.into_iter().map(CategoryItem::into_category).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> YouTubeClient {
        YouTubeClient::new(
            "test-key".to_string(),
            "https://example.invalid/youtube/v3/".to_string(),
            Duration::from_millis(0),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_client_creation_trims_base_url() {
        let client = client();
        assert_eq!(client.base_url, "https://example.invalid/youtube/v3");
        assert_eq!(client.api_key, "test-key");
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            YouTubeClient::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_quota_body_is_classified() {
        let body = r#"{"error": {"code": 403, "message": "The request cannot be completed because you have exceeded your quota.", "errors": [{"reason": "quotaExceeded"}]}}"#;
        let err = classify_error(StatusCode::FORBIDDEN, body);
        assert!(err.is_quota_exhausted());
    }

    #[test]
    fn test_rate_limit_fails_only_the_batch() {
        let body = r#"{"error": {"code": 403, "message": "User Rate Limit Exceeded", "errors": [{"reason": "rateLimitExceeded"}]}}"#;
        let err = classify_error(StatusCode::FORBIDDEN, body);
        assert!(!err.is_quota_exhausted());
        assert_eq!(
            err,
            RemoteError::Http {
                status: 403,
                message: "User Rate Limit Exceeded".to_string()
            }
        );
    }

    #[test]
    fn test_other_errors_keep_status() {
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(
            err,
            RemoteError::Http {
                status: 500,
                message: "Internal Server Error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_call() {
        let outcome = client().fetch_videos(&[]).await.unwrap();
        assert!(outcome.found.is_empty());
        assert!(outcome.not_found.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_batch_is_refused() {
        let ids: Vec<String> = (0..51).map(|n| format!("vid{:08}", n)).collect();
        assert!(client().fetch_videos(&ids).await.is_err());
    }
}
