// src/repositories/catalog_repository.rs
//
// Reference catalog persistence (topics, video categories)

use rusqlite::{params, Connection};

#[cfg(test)]
use super::parse_timestamp;
use crate::domain::{Category, Topic};
use crate::error::AppResult;

pub trait CatalogRepository<E>: Send + Sync {
    fn exists(&self, conn: &Connection, code: &str) -> AppResult<bool>;

    fn create(&self, conn: &Connection, entry: &E) -> AppResult<()>;

    fn count(&self, conn: &Connection) -> AppResult<usize>;

    #[cfg(test)]
    fn list(&self, conn: &Connection) -> AppResult<Vec<E>>;

    /// Removes every row, children before parents. Returns the number removed.
    fn delete_all(&self, conn: &Connection) -> AppResult<usize>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteTopicRepository;

impl SqliteTopicRepository {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogRepository<Topic> for SqliteTopicRepository {
    fn exists(&self, conn: &Connection, code: &str) -> AppResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM topic_categories WHERE topic_id = ?1)",
            params![code],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn create(&self, conn: &Connection, topic: &Topic) -> AppResult<()> {
        conn.execute(
            "INSERT INTO topic_categories (topic_id, name, parent_topic_id, topic_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                topic.topic_id,
                topic.name,
                topic.parent_topic_id,
                topic.topic_type,
                topic.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn count(&self, conn: &Connection) -> AppResult<usize> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM topic_categories", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[cfg(test)]
    fn list(&self, conn: &Connection) -> AppResult<Vec<Topic>> {
        let mut stmt = conn.prepare(
            "SELECT topic_id, name, parent_topic_id, topic_type, created_at
             FROM topic_categories
             ORDER BY topic_id",
        )?;
        let topics = stmt
            .query_map([], |row| {
                Ok(Topic {
                    topic_id: row.get(0)?,
                    name: row.get(1)?,
                    parent_topic_id: row.get(2)?,
                    topic_type: row.get(3)?,
                    created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(topics)
    }

    fn delete_all(&self, conn: &Connection) -> AppResult<usize> {
        // Peel leaves until the table is empty; each pass only removes rows no one points at.
        let mut deleted = 0;
        loop {
            let removed = conn.execute(
                "DELETE FROM topic_categories
                 WHERE topic_id NOT IN (
                     SELECT parent_topic_id FROM topic_categories
                     WHERE parent_topic_id IS NOT NULL
                 )",
                [],
            )?;
            if removed == 0 {
                break;
            }
            deleted += removed;
        }
        Ok(deleted)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteCategoryRepository;

impl SqliteCategoryRepository {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogRepository<Category> for SqliteCategoryRepository {
    fn exists(&self, conn: &Connection, code: &str) -> AppResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM video_categories WHERE category_id = ?1)",
            params![code],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn create(&self, conn: &Connection, category: &Category) -> AppResult<()> {
        conn.execute(
            "INSERT INTO video_categories (category_id, name, assignable, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                category.category_id,
                category.name,
                category.assignable,
                category.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn count(&self, conn: &Connection) -> AppResult<usize> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM video_categories", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[cfg(test)]
    fn list(&self, conn: &Connection) -> AppResult<Vec<Category>> {
        let mut stmt = conn.prepare(
            "SELECT category_id, name, assignable, created_at
             FROM video_categories
             ORDER BY CAST(category_id AS INTEGER), category_id",
        )?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    category_id: row.get(0)?,
                    name: row.get(1)?,
                    assignable: row.get(2)?,
                    created_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn delete_all(&self, conn: &Connection) -> AppResult<usize> {
        // videos.category_id is ON DELETE SET NULL
        let deleted = conn.execute("DELETE FROM video_categories", [])?;
        Ok(deleted)
    }
}
