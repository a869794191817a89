// src/repositories/video_repository.rs
//
// Video persistence

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    conversion_error, parse_optional_count, parse_optional_timestamp, parse_timestamp,
    read_availability, store_count,
};
use crate::domain::{PriorityTier, Video};
use crate::error::{AppError, AppResult};

pub trait VideoRepository: Send + Sync {
    fn get(&self, conn: &Connection, video_id: &str) -> AppResult<Option<Video>>;

    /// Candidates for a tier, ordered by id. `limit = None` means no limit.
    fn query_candidates(
        &self,
        conn: &Connection,
        tier: PriorityTier,
        limit: Option<usize>,
        include_unavailable: bool,
    ) -> AppResult<Vec<Video>>;

    fn count_candidates(
        &self,
        conn: &Connection,
        tier: PriorityTier,
        include_unavailable: bool,
    ) -> AppResult<usize>;

    fn create(&self, conn: &Connection, video: &Video) -> AppResult<()>;

    fn update(&self, conn: &Connection, video: &Video) -> AppResult<()>;
}

const VIDEO_COLUMNS: &str = "video_id, channel_id, title, description, published_at,
    duration_seconds, view_count, like_count, comment_count, default_language,
    made_for_kids, category_id, availability_status, unavailability_first_detected,
    recovered_at, recovery_source, enriched_at, created_at, updated_at";

/// One clause per tier; a tier selects rows matching its clause or any narrower one.
fn tier_clause(tier: PriorityTier) -> &'static str {
    match tier {
        PriorityTier::Low => "(title IS NULL OR TRIM(title) = '')",
        PriorityTier::Medium => "(duration_seconds IS NULL OR channel_id IS NULL)",
        PriorityTier::High => "(enriched_at IS NULL OR view_count IS NULL)",
        PriorityTier::All => "1 = 1",
    }
}

fn tier_predicate(tier: PriorityTier) -> String {
    let clauses: Vec<&str> = PriorityTier::ORDERED
        .iter()
        .filter(|t| tier.includes(**t))
        .map(|t| tier_clause(*t))
        .collect();
    format!("({})", clauses.join(" OR "))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteVideoRepository;

impl SqliteVideoRepository {
    pub fn new() -> Self {
        Self
    }

    fn row_to_video(row: &Row) -> rusqlite::Result<Video> {
        let duration: Option<i64> = row.get(5)?;
        let duration_seconds = duration
            .map(|d| {
                u32::try_from(d).map_err(|_| conversion_error(5, format!("Invalid duration {}", d)))
            })
            .transpose()?;

        Ok(Video {
            video_id: row.get(0)?,
            channel_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            published_at: parse_optional_timestamp(4, row.get(4)?)?,
            duration_seconds,
            view_count: parse_optional_count(6, row.get(6)?)?,
            like_count: parse_optional_count(7, row.get(7)?)?,
            comment_count: parse_optional_count(8, row.get(8)?)?,
            default_language: row.get(9)?,
            made_for_kids: row.get(10)?,
            category_id: row.get(11)?,
            availability: read_availability(row, 12)?,
            enriched_at: parse_optional_timestamp(16, row.get(16)?)?,
            created_at: parse_timestamp(17, &row.get::<_, String>(17)?)?,
            updated_at: parse_timestamp(18, &row.get::<_, String>(18)?)?,
        })
    }
}

impl VideoRepository for SqliteVideoRepository {
    fn get(&self, conn: &Connection, video_id: &str) -> AppResult<Option<Video>> {
        let sql = format!("SELECT {} FROM videos WHERE video_id = ?1", VIDEO_COLUMNS);
        let video = conn
            .query_row(&sql, params![video_id], Self::row_to_video)
            .optional()?;
        Ok(video)
    }

    fn query_candidates(
        &self,
        conn: &Connection,
        tier: PriorityTier,
        limit: Option<usize>,
        include_unavailable: bool,
    ) -> AppResult<Vec<Video>> {
        let sql = format!(
            "SELECT {} FROM videos
             WHERE {} AND (?1 OR availability_status != 'unavailable')
             ORDER BY video_id
             LIMIT ?2",
            VIDEO_COLUMNS,
            tier_predicate(tier)
        );
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let mut stmt = conn.prepare(&sql)?;
        let videos = stmt
            .query_map(params![include_unavailable, limit], Self::row_to_video)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(videos)
    }

    fn count_candidates(
        &self,
        conn: &Connection,
        tier: PriorityTier,
        include_unavailable: bool,
    ) -> AppResult<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM videos
             WHERE {} AND (?1 OR availability_status != 'unavailable')",
            tier_predicate(tier)
        );
        let count: i64 = conn.query_row(&sql, params![include_unavailable], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn create(&self, conn: &Connection, video: &Video) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO videos ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            VIDEO_COLUMNS
        );
        conn.execute(
            &sql,
            params![
                video.video_id,
                video.channel_id,
                video.title,
                video.description,
                video.published_at.map(|dt| dt.to_rfc3339()),
                video.duration_seconds,
                store_count("view_count", video.view_count)?,
                store_count("like_count", video.like_count)?,
                store_count("comment_count", video.comment_count)?,
                video.default_language,
                video.made_for_kids,
                video.category_id,
                video.availability.status().to_string(),
                video.availability.first_detected().map(|dt| dt.to_rfc3339()),
                video.availability.recovered_at.map(|dt| dt.to_rfc3339()),
                video.availability.recovery_source,
                video.enriched_at.map(|dt| dt.to_rfc3339()),
                video.created_at.to_rfc3339(),
                video.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection, video: &Video) -> AppResult<()> {
        let rows_affected = conn.execute(
            "UPDATE videos SET
                channel_id = ?2, title = ?3, description = ?4, published_at = ?5,
                duration_seconds = ?6, view_count = ?7, like_count = ?8, comment_count = ?9,
                default_language = ?10, made_for_kids = ?11, category_id = ?12,
                availability_status = ?13, unavailability_first_detected = ?14,
                recovered_at = ?15, recovery_source = ?16, enriched_at = ?17, updated_at = ?18
             WHERE video_id = ?1",
            params![
                video.video_id,
                video.channel_id,
                video.title,
                video.description,
                video.published_at.map(|dt| dt.to_rfc3339()),
                video.duration_seconds,
                store_count("view_count", video.view_count)?,
                store_count("like_count", video.like_count)?,
                store_count("comment_count", video.comment_count)?,
                video.default_language,
                video.made_for_kids,
                video.category_id,
                video.availability.status().to_string(),
                video.availability.first_detected().map(|dt| dt.to_rfc3339()),
                video.availability.recovered_at.map(|dt| dt.to_rfc3339()),
                video.availability.recovery_source,
                video.enriched_at.map(|dt| dt.to_rfc3339()),
                video.updated_at.to_rfc3339(),
            ],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
