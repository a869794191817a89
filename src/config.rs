// src/config.rs
//
// Application configuration
//
// Sources, lowest to highest precedence:
// 1. Built-in defaults
// 2. TOML file (--config PATH, or {config_dir}/vidledger/config.toml when present)
// 3. Environment variables

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::default_database_path;
use crate::error::{AppError, AppResult};

pub const ENV_DATABASE: &str = "VIDLEDGER_DATABASE";
pub const ENV_API_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_API_BASE_URL: &str = "VIDLEDGER_API_BASE_URL";
pub const ENV_REGION: &str = "VIDLEDGER_REGION";
pub const ENV_LOG: &str = "VIDLEDGER_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults to {data_dir}/vidledger/vidledger.db
    pub database_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub api_base_url: String,
    /// Region used for the video category catalog
    pub region_code: String,
    /// Minimum spacing between remote calls
    pub request_interval_ms: u64,
    pub request_timeout_secs: u64,
    /// Where run reports are written when --output is not given
    pub export_dir: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            api_key: None,
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            region_code: "US".to_string(),
            request_interval_ms: 100,
            request_timeout_secs: 30,
            export_dir: PathBuf::from("exports"),
            log_level: "info".to_string(),
        }
    }
}

/// {config_dir}/vidledger/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vidledger").join("config.toml"))
}

impl AppConfig {
    /// Load defaults, then the config file, then the process environment.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = lookup(ENV_DATABASE) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(region) = lookup(ENV_REGION) {
            self.region_code = region;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.region_code.trim().is_empty() {
            return Err(AppError::Config("region_code cannot be empty".to_string()));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::Config("api_base_url cannot be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> AppResult<LevelFilter> {
        LevelFilter::from_str(self.log_level.trim())
            .map_err(|_| AppError::Config(format!("Unknown log level '{}'", self.log_level)))
    }

    pub fn resolved_database_path(&self) -> AppResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => default_database_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.region_code, "US");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region_code = \"GB\"\nrequest_interval_ms = 250").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.region_code, "GB");
        assert_eq!(config.request_interval_ms, 250);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region_code = [").unwrap();

        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_KEY, "secret"),
            (ENV_REGION, "DE"),
            (ENV_DATABASE, "/tmp/ledger.db"),
            (ENV_LOG, " "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.region_code, "DE");
        assert_eq!(
            config.resolved_database_path().unwrap(),
            PathBuf::from("/tmp/ledger.db")
        );
        // Blank values are ignored
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.log_level = "chatty".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.region_code = "".to_string();
        assert!(config.validate().is_err());
    }
}
