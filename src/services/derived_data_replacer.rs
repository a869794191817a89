// src/services/derived_data_replacer.rs
//
// Derived Data Replacer
//
// Keeps one owner's derived set equal to the source list:
// delete every existing row, then insert the new values with positions 0..n.
//
// CRITICAL RULES:
// - Values are validated before anything is deleted
// - Never merges; the new list fully supersedes the old one
// - An empty list leaves zero rows (no "none" sentinel)
// - Runs inside the caller's unit of work; a nested SAVEPOINT keeps
//   delete+insert all-or-nothing even on a bare connection

use log::debug;
use rusqlite::Connection;
use std::sync::Arc;

use crate::domain::{DerivedValueRule, TAG_RULE, TOPIC_RULE};
use crate::error::AppResult;
use crate::repositories::{DerivedSetRepository, SqliteDerivedSetRepository};

const SAVEPOINT: &str = "derived_set_replace";

#[derive(Clone)]
pub struct DerivedDataReplacer {
    repo: Arc<dyn DerivedSetRepository>,
    rule: DerivedValueRule,
}

impl DerivedDataReplacer {
    pub fn new(repo: Arc<dyn DerivedSetRepository>, rule: DerivedValueRule) -> Self {
        Self { repo, rule }
    }

    pub fn video_tags() -> Self {
        Self::new(Arc::new(SqliteDerivedSetRepository::video_tags()), TAG_RULE)
    }

    pub fn video_topics() -> Self {
        Self::new(Arc::new(SqliteDerivedSetRepository::video_topics()), TOPIC_RULE)
    }

    pub fn channel_topics() -> Self {
        Self::new(Arc::new(SqliteDerivedSetRepository::channel_topics()), TOPIC_RULE)
    }

    /// Check a candidate set without touching storage
    pub fn validate<S: AsRef<str>>(&self, values: &[S]) -> AppResult<()> {
        self.rule.validate_all(values)?;
        Ok(())
    }

    /// Replace the set owned by `owner_id` with `values`.
    ///
    /// Returns the number of rows inserted (or that would be, with `dry_run`).
    pub fn replace<S: AsRef<str>>(
        &self,
        conn: &Connection,
        owner_id: &str,
        values: &[S],
        dry_run: bool,
    ) -> AppResult<usize> {
        self.validate(values)?;

        if dry_run {
            return Ok(values.len());
        }

        conn.execute_batch(&format!("SAVEPOINT {}", SAVEPOINT))?;
        match self.delete_then_insert(conn, owner_id, values) {
            Ok(created) => {
                conn.execute_batch(&format!("RELEASE {}", SAVEPOINT))?;
                Ok(created)
            }
            Err(e) => {
                conn.execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0}", SAVEPOINT))?;
                Err(e)
            }
        }
    }

    fn delete_then_insert<S: AsRef<str>>(
        &self,
        conn: &Connection,
        owner_id: &str,
        values: &[S],
    ) -> AppResult<usize> {
        let removed = self.repo.delete_for_owner(conn, owner_id)?;

        for (position, value) in values.iter().enumerate() {
            self.repo.insert(conn, owner_id, value.as_ref(), position)?;
        }

        debug!(
            "{} for {}: replaced {} rows with {}",
            self.repo.set_name(),
            owner_id,
            removed,
            values.len()
        );
        Ok(values.len())
    }

    #[cfg(test)]
    pub fn current(&self, conn: &Connection, owner_id: &str) -> AppResult<Vec<String>> {
        self.repo.list_for_owner(conn, owner_id)
    }
}
