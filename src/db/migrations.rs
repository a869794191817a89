// src/db/migrations.rs
//
// Schema versioning for the library database
//
// PRINCIPLES:
// - Every schema step is numbered and embedded in the binary
// - Pending steps run in one transaction, each recorded in schema_version
// - A database written by a newer build is refused, never downgraded

use chrono::Utc;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// (version, SQL) in ascending order
const MIGRATIONS: &[(i32, &str)] = &[(1, include_str!("../../schema.sql"))];

/// Tables the services read and write
const REQUIRED_TABLES: &[&str] = &[
    "channels",
    "videos",
    "video_tags",
    "video_topics",
    "channel_topics",
    "topic_categories",
    "video_categories",
];

fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Bring the schema up to the latest version. Safe to call on every start.
pub fn initialize_database(conn: &Connection) -> AppResult<()> {
    let current = schema_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(AppError::Other(format!(
            "Database schema version {} is newer than this build supports ({})",
            current, latest
        )));
    }

    let pending: Vec<&(i32, &str)> = MIGRATIONS.iter().filter(|(v, _)| *v > current).collect();
    if pending.is_empty() {
        return Ok(());
    }

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let applied = pending.iter().try_for_each(|(version, sql)| {
        conn.execute_batch(sql).map_err(|e| {
            AppError::Other(format!("Failed to apply schema version {}: {}", version, e))
        })?;
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![version, Utc::now().to_rfc3339()],
        )?;
        Ok::<(), AppError>(())
    });

    match applied {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            info!("Database schema upgraded from version {} to {}", current, latest);
            Ok(())
        }
        Err(e) => {
            conn.execute_batch("ROLLBACK")?;
            Err(e)
        }
    }
}

/// Highest applied version; 0 for a fresh database
pub fn schema_version(conn: &Connection) -> AppResult<i32> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if !has_table {
        return Ok(0);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

/// SQLite integrity check plus presence of every table the services use
pub fn verify_database_integrity(conn: &Connection) -> AppResult<()> {
    let result: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    if result != "ok" {
        return Err(AppError::Other(format!(
            "Database integrity check failed: {}",
            result
        )));
    }

    for table in REQUIRED_TABLES {
        let present = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !present {
            return Err(AppError::Other(format!("Missing table '{}'", table)));
        }
    }

    Ok(())
}

/// Row counts shown by the status command
pub fn get_database_stats(conn: &Connection) -> AppResult<DatabaseStats> {
    let count = |sql: &str| -> AppResult<i64> { Ok(conn.query_row(sql, [], |row| row.get(0))?) };

    Ok(DatabaseStats {
        video_count: count("SELECT COUNT(*) FROM videos")?,
        unavailable_video_count: count(
            "SELECT COUNT(*) FROM videos WHERE availability_status = 'unavailable'",
        )?,
        flagged_video_count: count(
            "SELECT COUNT(*) FROM videos
             WHERE availability_status = 'available' AND unavailability_first_detected IS NOT NULL",
        )?,
        channel_count: count("SELECT COUNT(*) FROM channels")?,
        unavailable_channel_count: count(
            "SELECT COUNT(*) FROM channels WHERE availability_status = 'unavailable'",
        )?,
        topic_count: count("SELECT COUNT(*) FROM topic_categories")?,
        category_count: count("SELECT COUNT(*) FROM video_categories")?,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub video_count: i64,
    pub unavailable_video_count: i64,
    /// Available, but missed by the last lookup
    pub flagged_video_count: i64,
    pub channel_count: i64,
    pub unavailable_channel_count: i64,
    pub topic_count: i64,
    pub category_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_connection;

    #[test]
    fn test_fresh_database_reaches_latest_version() {
        let conn = create_test_connection().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        initialize_database(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), latest_version());
        verify_database_integrity(&conn).unwrap();
    }

    #[test]
    fn test_second_initialize_is_a_no_op() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        initialize_database(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (99, '2030-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let err = initialize_database(&conn).unwrap_err();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn test_missing_table_fails_integrity_check() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        conn.execute_batch("DROP TABLE channel_topics").unwrap();

        let err = verify_database_integrity(&conn).unwrap_err();
        assert!(err.to_string().contains("channel_topics"));
    }

    #[test]
    fn test_video_with_unknown_channel_is_rejected() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO videos (video_id, channel_id, created_at, updated_at)
             VALUES ('dQw4w9WgXcQ', 'UCmissing', datetime('now'), datetime('now'))",
            [],
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_stats_count_flagged_separately() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO videos (video_id, created_at, updated_at)
                 VALUES ('aaaaaaaaaaa', 'now', 'now');
             INSERT INTO videos (video_id, unavailability_first_detected, created_at, updated_at)
                 VALUES ('bbbbbbbbbbb', '2024-01-01T00:00:00Z', 'now', 'now');
             INSERT INTO videos (video_id, availability_status, created_at, updated_at)
                 VALUES ('ccccccccccc', 'unavailable', 'now', 'now');",
        )
        .unwrap();

        let stats = get_database_stats(&conn).unwrap();

        assert_eq!(stats.video_count, 3);
        assert_eq!(stats.flagged_video_count, 1);
        assert_eq!(stats.unavailable_video_count, 1);
        assert_eq!(stats.channel_count, 0);
    }
}
