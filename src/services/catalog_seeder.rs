// src/services/catalog_seeder.rs
//
// Catalog Seeder
//
// Populates a small reference catalog from its source.
//
// MODES:
// - normal: create rows whose code is absent; existing rows are never touched
// - force:  delete the whole catalog (children before parents), then create everything
//
// The source is read before the transaction opens; all writes share one transaction.

use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::topic_catalog::CatalogSource;
use crate::domain::{validate_catalog_entry, CatalogEntry};
use crate::error::AppResult;
use crate::repositories::CatalogRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub created: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub total_processed: usize,
}

pub struct CatalogSeeder<E> {
    source: Arc<dyn CatalogSource<E>>,
    repo: Arc<dyn CatalogRepository<E>>,
}

impl<E> CatalogSeeder<E>
where
    E: CatalogEntry + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn CatalogSource<E>>, repo: Arc<dyn CatalogRepository<E>>) -> Self {
        Self { source, repo }
    }

    pub async fn seed(&self, conn: &mut Connection, force: bool) -> AppResult<SeedResult> {
        self.seed_with_mode(conn, force, false).await
    }

    /// Same counts as `seed`, nothing written
    pub async fn preview(&self, conn: &mut Connection, force: bool) -> AppResult<SeedResult> {
        self.seed_with_mode(conn, force, true).await
    }

    async fn seed_with_mode(
        &self,
        conn: &mut Connection,
        force: bool,
        dry_run: bool,
    ) -> AppResult<SeedResult> {
        let records = parents_first(self.source.fetch_catalog().await?);
        info!(
            "Seeding {} from {} records (force: {}, dry run: {})",
            self.source.name(),
            records.len(),
            force,
            dry_run
        );

        let tx = conn.transaction()?;
        let mut result = SeedResult::default();

        if force {
            result.deleted = if dry_run {
                self.repo.count(&tx)?
            } else {
                self.repo.delete_all(&tx)?
            };
        }

        // Codes already handled in this pass, so duplicates in the source are skipped
        let mut seen = HashSet::new();

        for record in &records {
            result.total_processed += 1;

            if let Err(e) = validate_catalog_entry(record) {
                warn!("Skipping {} entry: {}", self.source.name(), e);
                result.skipped += 1;
                continue;
            }

            if !seen.insert(record.code().to_string()) {
                result.skipped += 1;
                continue;
            }

            // After a force delete the catalog is empty, even when only previewing
            let exists = !(force && dry_run) && self.repo.exists(&tx, record.code())?;
            if exists {
                result.skipped += 1;
                continue;
            }

            if !dry_run {
                self.repo.create(&tx, record)?;
            }
            result.created += 1;
        }

        if dry_run {
            tx.rollback()?;
        } else {
            tx.commit()?;
        }

        info!(
            "Seeded {}: {} created, {} skipped, {} deleted",
            self.source.name(),
            result.created,
            result.skipped,
            result.deleted
        );
        Ok(result)
    }
}

/// Order records so every parent precedes its children.
/// Entries whose parent is not in the set keep their relative order at the end.
fn parents_first<E: CatalogEntry>(records: Vec<E>) -> Vec<E> {
    let mut placed: HashSet<String> = HashSet::new();
    let mut ordered = Vec::with_capacity(records.len());
    let mut pending = records;

    loop {
        let before = pending.len();
        let (ready, rest): (Vec<E>, Vec<E>) = pending.into_iter().partition(|r| {
            r.parent_code()
                .map_or(true, |parent| placed.contains(parent))
        });
        for record in &ready {
            placed.insert(record.code().to_string());
        }
        ordered.extend(ready);
        pending = rest;

        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    ordered.extend(pending);
    ordered
}
