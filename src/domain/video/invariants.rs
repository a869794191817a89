use regex::Regex;
use std::sync::OnceLock;

use super::entity::Video;
use crate::domain::{DomainError, DomainResult};

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"))
}

/// YouTube video ids are 11 characters of `[A-Za-z0-9_-]`
pub fn is_valid_video_id(id: &str) -> bool {
    video_id_pattern().is_match(id)
}

/// Validates Video invariants before a write
pub fn validate_video(video: &Video) -> DomainResult<()> {
    if video.video_id.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Video id cannot be empty".to_string(),
        ));
    }

    if let Some(title) = &video.title {
        if title.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "Video {} has a blank title",
                video.video_id
            )));
        }
    }

    Ok(())
}

/// Critical Video Invariants:
///
/// 1. video_id never changes
/// 2. A confirmed-unavailable video never carries a first-detection marker
///    (AvailabilityState has no such variant)
/// 3. Rows are never deleted; unavailability is recorded
/// 4. recovered_at/recovery_source change only on unavailable -> available

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_shape() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("a-b_c-d_e-f"));
        assert!(!is_valid_video_id("short"));
        assert!(!is_valid_video_id("dQw4w9WgXcQ!"));
        assert!(!is_valid_video_id("dQw4w9WgXc?"));
    }

    #[test]
    fn test_placeholder_is_valid() {
        assert!(validate_video(&Video::placeholder("dQw4w9WgXcQ")).is_ok());
    }

    #[test]
    fn test_blank_title_fails() {
        let mut video = Video::placeholder("dQw4w9WgXcQ");
        video.title = Some("  ".to_string());
        assert!(validate_video(&video).is_err());
    }
}
