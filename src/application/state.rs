// src/application/state.rs

use log::info;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::db::{
    create_connection_pool, get_connection, initialize_database, verify_database_integrity,
    ConnectionPool,
};
use crate::error::AppResult;
use crate::integrations::{RemoteSource, YouTubeClient};

/// Shared state handed to every command handler.
/// Built once in main.rs after configuration is loaded.
pub struct AppState {
    pub config: AppConfig,
    pub pool: ConnectionPool,
    /// Cancelled on Ctrl-C; runs stop before their next batch
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Open the pool and make sure the schema is current
    pub fn initialize(config: AppConfig) -> AppResult<Self> {
        let db_path = config.resolved_database_path()?;
        info!("Opening database {}", db_path.display());

        let pool = create_connection_pool(&db_path)?;
        {
            let conn = get_connection(&pool)?;
            initialize_database(&conn)?;
            verify_database_integrity(&conn)?;
        }

        Ok(Self {
            config,
            pool,
            shutdown: CancellationToken::new(),
        })
    }

    /// Remote client for commands that need the API. Fails without an API key.
    pub fn remote(&self) -> AppResult<Arc<dyn RemoteSource>> {
        Ok(Arc::new(YouTubeClient::from_config(&self.config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            database_path: Some(dir.join("data").join("library.db")),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_initialize_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::initialize(config_in(dir.path())).unwrap();

        let conn = get_connection(&state.pool).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'videos'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_remote_requires_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::initialize(config_in(dir.path())).unwrap();

        assert!(matches!(state.remote(), Err(AppError::Config(_))));
    }
}
