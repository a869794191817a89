// src/integrations/youtube/models.rs
//
// Wire types for the YouTube Data API and their mapping to metadata values.
// Counts arrive as decimal strings; a value that does not parse is dropped, not guessed.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::domain::{Category, ChannelMetadata, VideoMetadata};

/// `items` envelope shared by every list endpoint
#[derive(Debug, Deserialize)]
pub(super) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// `{"error": {...}}` body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
}

impl ErrorBody {
    pub fn is_quota_error(&self) -> bool {
        self.errors.iter().any(|e| {
            matches!(
                e.reason.as_str(),
                "quotaExceeded" | "dailyLimitExceeded"
            )
        })
    }
}

// ============================================================================
// videos.list
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    #[serde(default)]
    pub content_details: Option<ContentDetails>,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
    #[serde(default)]
    pub status: Option<VideoStatus>,
    #[serde(default)]
    pub topic_details: Option<TopicDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
    pub category_id: Option<String>,
    pub default_language: Option<String>,
    pub default_audio_language: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VideoStatus {
    pub made_for_kids: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TopicDetails {
    #[serde(default)]
    pub topic_ids: Vec<String>,
    #[serde(default)]
    pub relevant_topic_ids: Vec<String>,
}

impl TopicDetails {
    /// Primary topics first, then relevant ones, without duplicates
    fn merged(self) -> Vec<String> {
        let mut ids = self.topic_ids;
        for id in self.relevant_topic_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

impl VideoItem {
    pub fn into_metadata(self) -> VideoMetadata {
        let snippet = self.snippet;
        let statistics = self.statistics;

        let (title, description, channel_id, channel_title, published_at, category_id, language, tags) =
            match snippet {
                Some(s) => (
                    s.title,
                    s.description.filter(|d| !d.is_empty()),
                    s.channel_id,
                    s.channel_title,
                    s.published_at.as_deref().and_then(parse_published_at),
                    s.category_id,
                    s.default_language.or(s.default_audio_language),
                    s.tags,
                ),
                None => (String::new(), None, None, None, None, None, None, Vec::new()),
            };

        VideoMetadata {
            video_id: self.id,
            title,
            description,
            channel_id,
            channel_title,
            published_at,
            duration_seconds: self
                .content_details
                .and_then(|c| c.duration)
                .as_deref()
                .and_then(parse_iso8601_duration),
            view_count: statistics.as_ref().and_then(|s| parse_count(&s.view_count)),
            like_count: statistics.as_ref().and_then(|s| parse_count(&s.like_count)),
            comment_count: statistics.as_ref().and_then(|s| parse_count(&s.comment_count)),
            default_language: language,
            made_for_kids: self.status.and_then(|s| s.made_for_kids),
            category_id,
            tags,
            topic_ids: self.topic_details.map(TopicDetails::merged).unwrap_or_default(),
        }
    }
}

// ============================================================================
// channels.list
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChannelItem {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<ChannelSnippet>,
    #[serde(default)]
    pub statistics: Option<ChannelStatistics>,
    #[serde(default)]
    pub topic_details: Option<TopicDetails>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChannelStatistics {
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
}

impl ChannelItem {
    pub fn into_metadata(self) -> ChannelMetadata {
        let (title, description, country) = match self.snippet {
            Some(s) => (s.title, s.description.filter(|d| !d.is_empty()), s.country),
            None => (String::new(), None, None),
        };

        let (subscriber_count, video_count) = match &self.statistics {
            Some(s) => (
                // Hidden counts are reported as rounded placeholders
                if s.hidden_subscriber_count {
                    None
                } else {
                    parse_count(&s.subscriber_count)
                },
                parse_count(&s.video_count),
            ),
            None => (None, None),
        };

        ChannelMetadata {
            channel_id: self.id,
            title,
            description,
            subscriber_count,
            video_count,
            country,
            topic_ids: self.topic_details.map(TopicDetails::merged).unwrap_or_default(),
        }
    }
}

// ============================================================================
// videoCategories.list
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct CategoryItem {
    pub id: String,
    pub snippet: CategorySnippet,
}

#[derive(Debug, Deserialize)]
pub(super) struct CategorySnippet {
    pub title: String,
    #[serde(default)]
    pub assignable: bool,
}

impl CategoryItem {
    pub fn into_category(self) -> Category {
        Category::new(&self.id, &self.snippet.title, self.snippet.assignable)
    }
}

// ============================================================================
// Scalar parsing
// ============================================================================

/// Counts must fit the INTEGER column they land in
fn parse_count(value: &Option<String>) -> Option<u64> {
    value
        .as_deref()
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|n| u64::try_from(n).ok())
}

fn parse_published_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("valid duration regex")
    })
}

/// `PT1H2M3S` → 3723. Live streams report `P0D`.
pub(crate) fn parse_iso8601_duration(value: &str) -> Option<u32> {
    let caps = duration_pattern().captures(value)?;
    let part = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };

    let units: [(usize, u64); 5] = [(1, 604_800), (2, 86_400), (3, 3_600), (4, 60), (5, 1)];
    let mut total: u64 = 0;
    for (group, seconds) in units {
        total = total.checked_add(part(group)?.checked_mul(seconds)?)?;
    }
    u32::try_from(total).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_iso8601_duration("PT3M33S"), Some(213));
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration("P1DT1S"), Some(86_401));
        assert_eq!(parse_iso8601_duration("P0D"), Some(0));
        assert_eq!(parse_iso8601_duration("3:33"), None);
    }

    #[test]
    fn test_video_item_mapping() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "snippet": {
                "title": "Never Gonna Give You Up",
                "description": "",
                "channelId": "UCuAXFkgsw1L7xaCfnd5JJOw",
                "channelTitle": "Rick Astley",
                "publishedAt": "2009-10-25T06:57:33Z",
                "categoryId": "10",
                "defaultAudioLanguage": "en",
                "tags": ["rick astley", "80s"]
            },
            "contentDetails": { "duration": "PT3M33S" },
            "statistics": { "viewCount": "1500000000", "likeCount": "17000000" },
            "status": { "madeForKids": false },
            "topicDetails": {
                "topicIds": ["/m/04rlf"],
                "relevantTopicIds": ["/m/04rlf", "/m/064t9"]
            }
        }"#;

        let item: VideoItem = serde_json::from_str(json).unwrap();
        let metadata = item.into_metadata();

        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert!(metadata.description.is_none());
        assert_eq!(metadata.channel_title.as_deref(), Some("Rick Astley"));
        assert_eq!(metadata.duration_seconds, Some(213));
        assert_eq!(metadata.view_count, Some(1_500_000_000));
        assert_eq!(metadata.comment_count, None);
        assert_eq!(metadata.default_language.as_deref(), Some("en"));
        assert_eq!(metadata.made_for_kids, Some(false));
        assert_eq!(metadata.tags, vec!["rick astley", "80s"]);
        assert_eq!(metadata.topic_ids, vec!["/m/04rlf", "/m/064t9"]);
        assert!(metadata.published_at.is_some());
    }

    #[test]
    fn test_hidden_subscriber_count_is_dropped() {
        let json = r#"{
            "id": "UCuAXFkgsw1L7xaCfnd5JJOw",
            "snippet": { "title": "Rick Astley", "country": "GB" },
            "statistics": { "subscriberCount": "4000000", "videoCount": "300", "hiddenSubscriberCount": true }
        }"#;

        let metadata = serde_json::from_str::<ChannelItem>(json).unwrap().into_metadata();

        assert_eq!(metadata.subscriber_count, None);
        assert_eq!(metadata.video_count, Some(300));
        assert_eq!(metadata.country.as_deref(), Some("GB"));
    }

    #[test]
    fn test_quota_error_detection() {
        let json = r#"{"error": {"code": 403, "message": "quota", "errors": [{"reason": "quotaExceeded"}]}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.error.is_quota_error());
    }

    #[test]
    fn test_rate_limit_is_not_quota_exhaustion() {
        let json = r#"{"error": {"code": 403, "message": "slow down", "errors": [{"reason": "rateLimitExceeded"}]}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert!(!envelope.error.is_quota_error());
    }

    #[test]
    fn test_counts_outside_integer_range_are_dropped() {
        assert_eq!(parse_count(&Some("9223372036854775807".to_string())), Some(i64::MAX as u64));
        assert_eq!(parse_count(&Some("9223372036854775808".to_string())), None);
        assert_eq!(parse_count(&Some("18446744073709551615".to_string())), None);
        assert_eq!(parse_count(&Some("-5".to_string())), None);
        assert_eq!(parse_count(&Some("12".to_string())), Some(12));
    }
}
