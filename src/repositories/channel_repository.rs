// src/repositories/channel_repository.rs
//
// Channel persistence

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    parse_optional_count, parse_optional_timestamp, parse_timestamp, read_availability,
    store_count,
};
use crate::domain::Channel;
use crate::error::{AppError, AppResult};

pub trait ChannelRepository: Send + Sync {
    fn get(&self, conn: &Connection, channel_id: &str) -> AppResult<Option<Channel>>;

    fn exists(&self, conn: &Connection, channel_id: &str) -> AppResult<bool>;

    /// Never-enriched channels first, then by id.
    fn query_candidates(
        &self,
        conn: &Connection,
        limit: Option<usize>,
        include_unavailable: bool,
    ) -> AppResult<Vec<Channel>>;

    /// Size of the unlimited candidate set, without loading rows
    fn count_candidates(&self, conn: &Connection, include_unavailable: bool) -> AppResult<usize>;

    fn create(&self, conn: &Connection, channel: &Channel) -> AppResult<()>;

    fn update(&self, conn: &Connection, channel: &Channel) -> AppResult<()>;
}

const CHANNEL_COLUMNS: &str = "channel_id, title, description, subscriber_count, video_count,
    country, availability_status, unavailability_first_detected, recovered_at,
    recovery_source, enriched_at, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteChannelRepository;

impl SqliteChannelRepository {
    pub fn new() -> Self {
        Self
    }

    fn row_to_channel(row: &Row) -> rusqlite::Result<Channel> {
        Ok(Channel {
            channel_id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            subscriber_count: parse_optional_count(3, row.get(3)?)?,
            video_count: parse_optional_count(4, row.get(4)?)?,
            country: row.get(5)?,
            availability: read_availability(row, 6)?,
            enriched_at: parse_optional_timestamp(10, row.get(10)?)?,
            created_at: parse_timestamp(11, &row.get::<_, String>(11)?)?,
            updated_at: parse_timestamp(12, &row.get::<_, String>(12)?)?,
        })
    }
}

impl ChannelRepository for SqliteChannelRepository {
    fn get(&self, conn: &Connection, channel_id: &str) -> AppResult<Option<Channel>> {
        let sql = format!("SELECT {} FROM channels WHERE channel_id = ?1", CHANNEL_COLUMNS);
        let channel = conn
            .query_row(&sql, params![channel_id], Self::row_to_channel)
            .optional()?;
        Ok(channel)
    }

    fn exists(&self, conn: &Connection, channel_id: &str) -> AppResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM channels WHERE channel_id = ?1)",
            params![channel_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn query_candidates(
        &self,
        conn: &Connection,
        limit: Option<usize>,
        include_unavailable: bool,
    ) -> AppResult<Vec<Channel>> {
        let sql = format!(
            "SELECT {} FROM channels
             WHERE (?1 OR availability_status != 'unavailable')
             ORDER BY enriched_at IS NOT NULL, channel_id
             LIMIT ?2",
            CHANNEL_COLUMNS
        );
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let mut stmt = conn.prepare(&sql)?;
        let channels = stmt
            .query_map(params![include_unavailable, limit], Self::row_to_channel)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(channels)
    }

    fn count_candidates(&self, conn: &Connection, include_unavailable: bool) -> AppResult<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM channels WHERE (?1 OR availability_status != 'unavailable')",
            params![include_unavailable],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn create(&self, conn: &Connection, channel: &Channel) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO channels ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            CHANNEL_COLUMNS
        );
        conn.execute(
            &sql,
            params![
                channel.channel_id,
                channel.title,
                channel.description,
                store_count("subscriber_count", channel.subscriber_count)?,
                store_count("video_count", channel.video_count)?,
                channel.country,
                channel.availability.status().to_string(),
                channel.availability.first_detected().map(|dt| dt.to_rfc3339()),
                channel.availability.recovered_at.map(|dt| dt.to_rfc3339()),
                channel.availability.recovery_source,
                channel.enriched_at.map(|dt| dt.to_rfc3339()),
                channel.created_at.to_rfc3339(),
                channel.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection, channel: &Channel) -> AppResult<()> {
        let rows_affected = conn.execute(
            "UPDATE channels SET
                title = ?2, description = ?3, subscriber_count = ?4, video_count = ?5,
                country = ?6, availability_status = ?7, unavailability_first_detected = ?8,
                recovered_at = ?9, recovery_source = ?10, enriched_at = ?11, updated_at = ?12
             WHERE channel_id = ?1",
            params![
                channel.channel_id,
                channel.title,
                channel.description,
                store_count("subscriber_count", channel.subscriber_count)?,
                store_count("video_count", channel.video_count)?,
                channel.country,
                channel.availability.status().to_string(),
                channel.availability.first_detected().map(|dt| dt.to_rfc3339()),
                channel.availability.recovered_at.map(|dt| dt.to_rfc3339()),
                channel.availability.recovery_source,
                channel.enriched_at.map(|dt| dt.to_rfc3339()),
                channel.updated_at.to_rfc3339(),
            ],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
