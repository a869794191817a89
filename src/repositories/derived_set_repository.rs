// src/repositories/derived_set_repository.rs
//
// Ordered one-to-many value sets owned by a single entity
// (video tags, video topics, channel topics).

use rusqlite::{params, Connection};

use crate::error::AppResult;

pub trait DerivedSetRepository: Send + Sync {
    /// Name used in logs and error messages
    fn set_name(&self) -> &'static str;

    /// Returns the number of rows removed
    fn delete_for_owner(&self, conn: &Connection, owner_id: &str) -> AppResult<usize>;

    fn insert(&self, conn: &Connection, owner_id: &str, value: &str, position: usize)
        -> AppResult<()>;

    /// Values in position order
    #[cfg(test)]
    fn list_for_owner(&self, conn: &Connection, owner_id: &str) -> AppResult<Vec<String>>;
}

/// Table layout of one derived set. All identifiers are compile-time constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteDerivedSetRepository {
    table: &'static str,
    owner_column: &'static str,
    value_column: &'static str,
    position_column: &'static str,
}

impl SqliteDerivedSetRepository {
    pub const fn video_tags() -> Self {
        Self {
            table: "video_tags",
            owner_column: "video_id",
            value_column: "tag",
            position_column: "tag_order",
        }
    }

    pub const fn video_topics() -> Self {
        Self {
            table: "video_topics",
            owner_column: "video_id",
            value_column: "topic_id",
            position_column: "position",
        }
    }

    pub const fn channel_topics() -> Self {
        Self {
            table: "channel_topics",
            owner_column: "channel_id",
            value_column: "topic_id",
            position_column: "position",
        }
    }
}

impl DerivedSetRepository for SqliteDerivedSetRepository {
    fn set_name(&self) -> &'static str {
        self.table
    }

    fn delete_for_owner(&self, conn: &Connection, owner_id: &str) -> AppResult<usize> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", self.table, self.owner_column);
        let deleted = conn.execute(&sql, params![owner_id])?;
        Ok(deleted)
    }

    fn insert(
        &self,
        conn: &Connection,
        owner_id: &str,
        value: &str,
        position: usize,
    ) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}) VALUES (?1, ?2, ?3)",
            self.table, self.owner_column, self.value_column, self.position_column
        );
        conn.execute(&sql, params![owner_id, value, position as i64])?;
        Ok(())
    }

    #[cfg(test)]
    fn list_for_owner(&self, conn: &Connection, owner_id: &str) -> AppResult<Vec<String>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY {}",
            self.value_column, self.table, self.owner_column, self.position_column
        );
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map(params![owner_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Video;
    use crate::repositories::test_support::migrated_connection;
    use crate::repositories::{SqliteVideoRepository, VideoRepository};

    #[test]
    fn test_insert_list_delete() {
        let conn = migrated_connection();
        SqliteVideoRepository::new()
            .create(&conn, &Video::placeholder("dQw4w9WgXcQ"))
            .unwrap();
        let tags = SqliteDerivedSetRepository::video_tags();

        tags.insert(&conn, "dQw4w9WgXcQ", "second", 1).unwrap();
        tags.insert(&conn, "dQw4w9WgXcQ", "first", 0).unwrap();

        assert_eq!(
            tags.list_for_owner(&conn, "dQw4w9WgXcQ").unwrap(),
            vec!["first", "second"]
        );
        assert_eq!(tags.delete_for_owner(&conn, "dQw4w9WgXcQ").unwrap(), 2);
        assert!(tags.list_for_owner(&conn, "dQw4w9WgXcQ").unwrap().is_empty());
    }

    #[test]
    fn test_topic_rows_require_known_topic() {
        let conn = migrated_connection();
        SqliteVideoRepository::new()
            .create(&conn, &Video::placeholder("dQw4w9WgXcQ"))
            .unwrap();

        let result =
            SqliteDerivedSetRepository::video_topics().insert(&conn, "dQw4w9WgXcQ", "/m/none", 0);

        assert!(result.is_err());
    }
}
