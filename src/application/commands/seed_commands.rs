// src/application/commands/seed_commands.rs

use rusqlite::Connection;
use std::sync::Arc;

use crate::application::cli::{SeedArgs, SeedTarget};
use crate::application::error_handling::ExitStatus;
use crate::application::state::AppState;
use crate::db::get_connection;
use crate::domain::{CatalogEntry, Category, Topic};
use crate::error::AppResult;
use crate::repositories::{SqliteCategoryRepository, SqliteTopicRepository};
use crate::services::{CatalogSeeder, RemoteCategoryCatalog, SeedResult, StaticTopicCatalog};

/// `vidledger seed <topics|categories>`
pub async fn seed_catalog(state: &AppState, args: SeedArgs) -> AppResult<ExitStatus> {
    let mut conn = get_connection(&state.pool)?;

    let result = match args.target {
        SeedTarget::Topics => {
            let seeder = CatalogSeeder::<Topic>::new(
                Arc::new(StaticTopicCatalog),
                Arc::new(SqliteTopicRepository::new()),
            );
            run_seeder(&seeder, &mut conn, args.force, args.dry_run).await?
        }
        SeedTarget::Categories => {
            let source = RemoteCategoryCatalog::new(state.remote()?, state.config.region_code.clone());
            let seeder = CatalogSeeder::<Category>::new(
                Arc::new(source),
                Arc::new(SqliteCategoryRepository::new()),
            );
            run_seeder(&seeder, &mut conn, args.force, args.dry_run).await?
        }
    };

    println!(
        "Seeded {:?}{}: {} created, {} skipped, {} deleted ({} processed)",
        args.target,
        if args.dry_run { " (dry run)" } else { "" },
        result.created,
        result.skipped,
        result.deleted,
        result.total_processed
    );
    Ok(ExitStatus::Clean)
}

async fn run_seeder<E>(
    seeder: &CatalogSeeder<E>,
    conn: &mut Connection,
    force: bool,
    dry_run: bool,
) -> AppResult<SeedResult>
where
    E: CatalogEntry + Send + Sync + 'static,
{
    if dry_run {
        seeder.preview(conn, force).await
    } else {
        seeder.seed(conn, force).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::AppError;
    use crate::repositories::CatalogRepository;

    fn state_in(dir: &std::path::Path) -> AppState {
        AppState::initialize(AppConfig {
            database_path: Some(dir.join("library.db")),
            ..AppConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_seed_topics_needs_no_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let status = seed_catalog(
            &state,
            SeedArgs {
                target: SeedTarget::Topics,
                force: false,
                dry_run: false,
            },
        )
        .await
        .unwrap();

        assert_eq!(status, ExitStatus::Clean);
        let conn = get_connection(&state.pool).unwrap();
        assert_eq!(
            SqliteTopicRepository::new().count(&conn).unwrap(),
            StaticTopicCatalog::topics().len()
        );
    }

    #[tokio::test]
    async fn test_seed_categories_requires_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let result = seed_catalog(
            &state,
            SeedArgs {
                target: SeedTarget::Categories,
                force: false,
                dry_run: true,
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
