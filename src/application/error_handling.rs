// src/application/error_handling.rs
//
// Error handling at the process boundary
//
// ARCHITECTURE:
// - Maps internal errors to an error category, a user-facing message and an exit code
// - A run that starts always finishes with a report; only startup failures reach here
// - Partial failure is reported through the report's error counter, never through Err

use serde::{Deserialize, Serialize};
use std::process::ExitCode;

use crate::domain::DomainError;
use crate::error::AppError;
use crate::services::EnrichmentReport;

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    /// Completed with no errors
    Clean,
    /// Failed to start (configuration, database, missing API key)
    StartupFailure,
    /// Priority tier not recognised
    InvalidPriority,
    /// Ran to the end (or was halted) with per-entity errors
    CompletedWithErrors,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::StartupFailure => 1,
            ExitStatus::InvalidPriority => 2,
            ExitStatus::CompletedWithErrors => 3,
        }
    }

    /// A halted run is incomplete even when no entity failed
    pub fn from_report(report: &EnrichmentReport) -> Self {
        if report.has_errors() || report.halted_reason().is_some() {
            ExitStatus::CompletedWithErrors
        } else {
            ExitStatus::Clean
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Error categories shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Invalid input/validation error
    Validation,

    /// Missing or invalid configuration
    Configuration,

    /// Database/persistence error
    Database,

    /// YouTube API error
    ExternalService,

    /// File system error
    FileSystem,

    /// Other/unknown error
    Internal,
}

/// Standard error response for the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        match error {
            AppError::Domain(DomainError::UnknownPriorityTier(_)) => Self {
                error_type: ErrorType::Validation,
                message: error.to_string(),
                details: None,
            },

            AppError::Domain(domain_error) => Self {
                error_type: ErrorType::Validation,
                message: "Domain validation failed".to_string(),
                details: Some(domain_error.to_string()),
            },

            AppError::Config(message) => Self {
                error_type: ErrorType::Configuration,
                message: "Configuration error".to_string(),
                details: Some(message.clone()),
            },

            AppError::Database(_) | AppError::Pool(_) | AppError::NotFound => Self {
                error_type: ErrorType::Database,
                message: "Database operation failed".to_string(),
                details: Some(error.to_string()),
            },

            AppError::Remote(remote_error) => Self {
                error_type: ErrorType::ExternalService,
                message: "YouTube API request failed".to_string(),
                details: Some(remote_error.to_string()),
            },

            AppError::Io(io_error) => Self {
                error_type: ErrorType::FileSystem,
                message: "File system operation failed".to_string(),
                details: Some(io_error.to_string()),
            },

            AppError::Serialization(_) | AppError::Other(_) => Self {
                error_type: ErrorType::Internal,
                message: error.to_string(),
                details: None,
            },
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details),
            None => f.write_str(&self.message),
        }
    }
}

/// Exit status for an error that stopped a command before it produced a report
pub fn exit_status_for(error: &AppError) -> ExitStatus {
    match error {
        AppError::Domain(DomainError::UnknownPriorityTier(_)) => ExitStatus::InvalidPriority,
        _ => ExitStatus::StartupFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::RemoteError;
    use crate::services::ReportBuilder;

    #[test]
    fn test_unknown_priority_maps_to_its_own_exit_code() {
        let error = AppError::Domain(DomainError::UnknownPriorityTier("urgent".to_string()));

        assert_eq!(exit_status_for(&error), ExitStatus::InvalidPriority);
        assert_eq!(exit_status_for(&error).code(), 2);
        let response = ErrorResponse::from_app_error(&error);
        assert_eq!(response.error_type, ErrorType::Validation);
        assert!(response.to_string().contains("urgent"));
    }

    #[test]
    fn test_startup_failures() {
        let missing_key = AppError::Config("No API key configured".to_string());
        assert_eq!(exit_status_for(&missing_key), ExitStatus::StartupFailure);
        assert_eq!(
            ErrorResponse::from_app_error(&missing_key).error_type,
            ErrorType::Configuration
        );

        let remote = AppError::Remote(RemoteError::Transport("dns".to_string()));
        assert_eq!(
            ErrorResponse::from_app_error(&remote).error_type,
            ErrorType::ExternalService
        );
        assert_eq!(exit_status_for(&remote).code(), 1);
    }

    #[test]
    fn test_report_exit_status() {
        let clean = ReportBuilder::new("low", false).finish();
        assert_eq!(ExitStatus::from_report(&clean), ExitStatus::Clean);

        let mut with_error = ReportBuilder::new("low", false);
        with_error.record_error("dQw4w9WgXcQ", "database is locked");
        assert_eq!(
            ExitStatus::from_report(&with_error.finish()).code(),
            3
        );

        let mut halted = ReportBuilder::new("low", false);
        halted.halt("cancelled before batch 2 of 3");
        assert_eq!(
            ExitStatus::from_report(&halted.finish()),
            ExitStatus::CompletedWithErrors
        );
    }

    #[test]
    fn test_serialization() {
        let response = ErrorResponse::from_app_error(&AppError::Config("bad level".to_string()));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("configuration"));
        assert!(json.contains("bad level"));
    }
}
