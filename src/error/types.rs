// src/error/types.rs
use crate::domain::DomainError;
use crate::integrations::RemoteError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable config file or missing API key
    #[error("Configuration error: {0}")]
    Config(String),

    /// Update targeted a row that does not exist
    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(format!("no database connection available: {}", err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_converts() {
        let err: AppError = RemoteError::Transport("connection reset".to_string()).into();
        assert!(matches!(err, AppError::Remote(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_serializes_as_message() {
        let json = serde_json::to_string(&AppError::NotFound).unwrap();
        assert_eq!(json, "\"Resource not found\"");
    }
}
