use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::availability::{Availability, RemoteEntity, Trackable};

/// A video known to the local library.
/// Created upstream as a placeholder (id only) and filled in by enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Stable external id (immutable)
    pub video_id: String,

    /// Owning channel, once known
    pub channel_id: Option<String>,

    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u32>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub default_language: Option<String>,
    pub made_for_kids: Option<bool>,
    pub category_id: Option<String>,

    pub availability: Availability,

    /// Last time remote metadata was applied
    pub enriched_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the remote reports for one video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    /// Used to name a placeholder channel the library has not seen yet
    pub channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u32>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub default_language: Option<String>,
    pub made_for_kids: Option<bool>,
    pub category_id: Option<String>,
    pub tags: Vec<String>,
    pub topic_ids: Vec<String>,
}

impl Video {
    /// Minimal row carrying identity only
    pub fn placeholder(video_id: &str) -> Self {
        let now = Utc::now();
        Self {
            video_id: video_id.to_string(),
            channel_id: None,
            title: None,
            description: None,
            published_at: None,
            duration_seconds: None,
            view_count: None,
            like_count: None,
            comment_count: None,
            default_language: None,
            made_for_kids: None,
            category_id: None,
            availability: Availability::default(),
            enriched_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.title.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

impl Trackable for Video {
    fn entity_id(&self) -> &str {
        &self.video_id
    }

    fn availability(&self) -> &Availability {
        &self.availability
    }

    fn availability_mut(&mut self) -> &mut Availability {
        &mut self.availability
    }
}

impl RemoteEntity for Video {
    type Metadata = VideoMetadata;

    /// Overwrites every remote-owned field. Category, tags and topics are
    /// applied by the caller because they depend on catalog lookups.
    fn apply_metadata(&mut self, metadata: &VideoMetadata, now: DateTime<Utc>) {
        self.title = Some(metadata.title.clone());
        self.description = metadata.description.clone();
        if metadata.channel_id.is_some() {
            self.channel_id = metadata.channel_id.clone();
        }
        self.published_at = metadata.published_at;
        self.duration_seconds = metadata.duration_seconds;
        self.view_count = metadata.view_count;
        self.like_count = metadata.like_count;
        self.comment_count = metadata.comment_count;
        self.default_language = metadata.default_language.clone();
        self.made_for_kids = metadata.made_for_kids;
        self.enriched_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_has_identity_only() {
        let video = Video::placeholder("dQw4w9WgXcQ");
        assert!(video.is_placeholder());
        assert!(video.channel_id.is_none());
        assert!(!video.availability.is_unavailable());
    }

    #[test]
    fn test_apply_metadata_fills_fields() {
        let mut video = Video::placeholder("dQw4w9WgXcQ");
        let metadata = VideoMetadata {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "Never Gonna Give You Up".to_string(),
            channel_id: Some("UCuAXFkgsw1L7xaCfnd5JJOw".to_string()),
            duration_seconds: Some(213),
            view_count: Some(1_000),
            ..VideoMetadata::default()
        };
        let now = Utc::now();

        video.apply_metadata(&metadata, now);

        assert!(!video.is_placeholder());
        assert_eq!(video.channel_id.as_deref(), Some("UCuAXFkgsw1L7xaCfnd5JJOw"));
        assert_eq!(video.duration_seconds, Some(213));
        assert_eq!(video.enriched_at, Some(now));
    }

    #[test]
    fn test_missing_remote_channel_keeps_local_link() {
        let mut video = Video::placeholder("dQw4w9WgXcQ");
        video.channel_id = Some("UCuAXFkgsw1L7xaCfnd5JJOw".to_string());
        let metadata = VideoMetadata {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "t".to_string(),
            ..VideoMetadata::default()
        };

        video.apply_metadata(&metadata, Utc::now());

        assert_eq!(video.channel_id.as_deref(), Some("UCuAXFkgsw1L7xaCfnd5JJOw"));
    }
}
