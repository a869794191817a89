use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::domain::availability::{Availability, RemoteEntity, Trackable};

/// A channel known to the local library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Stable external id (immutable)
    pub channel_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub country: Option<String>,
    pub availability: Availability,
    pub enriched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the remote reports for one channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub channel_id: String,
    pub title: String,
    pub description: Option<String>,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub country: Option<String>,
    pub topic_ids: Vec<String>,
}

impl Channel {
    /// Minimal row created so a video can reference a channel we have not enriched.
    pub fn placeholder(channel_id: &str, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            channel_id: channel_id.to_string(),
            title,
            description: None,
            subscriber_count: None,
            video_count: None,
            country: None,
            availability: Availability::default(),
            enriched_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.enriched_at.is_none()
    }
}

impl Trackable for Channel {
    fn entity_id(&self) -> &str {
        &self.channel_id
    }

    fn availability(&self) -> &Availability {
        &self.availability
    }

    fn availability_mut(&mut self) -> &mut Availability {
        &mut self.availability
    }
}

impl RemoteEntity for Channel {
    type Metadata = ChannelMetadata;

    fn apply_metadata(&mut self, metadata: &ChannelMetadata, now: DateTime<Utc>) {
        self.title = Some(metadata.title.clone());
        self.description = metadata.description.clone();
        self.subscriber_count = metadata.subscriber_count;
        self.video_count = metadata.video_count;
        self.country = metadata.country.clone();
        self.enriched_at = Some(now);
        self.updated_at = now;
    }
}

fn channel_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^UC[A-Za-z0-9_-]{22}$").expect("valid channel id regex"))
}

/// Channel ids are `UC` followed by 22 characters of `[A-Za-z0-9_-]`
pub fn is_valid_channel_id(id: &str) -> bool {
    channel_id_pattern().is_match(id)
}
