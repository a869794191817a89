// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO cross-repository calls
// - Explicit SQL only
// - Every method runs on the caller's connection; the caller owns the transaction

pub mod catalog_repository;
pub mod channel_repository;
pub mod derived_set_repository;
pub mod video_repository;

pub use catalog_repository::{CatalogRepository, SqliteCategoryRepository, SqliteTopicRepository};
pub use channel_repository::{ChannelRepository, SqliteChannelRepository};
pub use derived_set_repository::{DerivedSetRepository, SqliteDerivedSetRepository};
pub use video_repository::{SqliteVideoRepository, VideoRepository};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

use crate::domain::{Availability, AvailabilityState, AvailabilityStatus};

/// Wrap a parse failure so it surfaces as an explicit conversion error, never a silent default.
pub(crate) fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

pub(crate) fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, format!("Invalid timestamp '{}': {}", value, e)))
}

pub(crate) fn parse_optional_timestamp(
    column: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(column, &v)).transpose()
}

/// Counts are stored as INTEGER; negative values are corrupt rows.
pub(crate) fn parse_optional_count(column: usize, value: Option<i64>) -> rusqlite::Result<Option<u64>> {
    value
        .map(|v| {
            u64::try_from(v)
                .map_err(|_| conversion_error(column, format!("Negative count {}", v)))
        })
        .transpose()
}

/// Counts above `i64::MAX` cannot be stored and are refused rather than wrapped.
pub(crate) fn store_count(field: &str, value: Option<u64>) -> rusqlite::Result<Option<i64>> {
    value
        .map(|v| {
            i64::try_from(v).map_err(|_| {
                rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("{} {} exceeds the storable range", field, v),
                )))
            })
        })
        .transpose()
}

/// Rebuild an `Availability` from its four columns starting at `first_column`:
/// status, first_detected, recovered_at, recovery_source.
pub(crate) fn read_availability(
    row: &rusqlite::Row,
    first_column: usize,
) -> rusqlite::Result<Availability> {
    let status_str: String = row.get(first_column)?;
    let status: AvailabilityStatus = status_str
        .parse()
        .map_err(|e: crate::domain::DomainError| conversion_error(first_column, e.to_string()))?;
    let first_detected = parse_optional_timestamp(first_column + 1, row.get(first_column + 1)?)?;
    let recovered_at = parse_optional_timestamp(first_column + 2, row.get(first_column + 2)?)?;
    let recovery_source: Option<String> = row.get(first_column + 3)?;

    Ok(Availability {
        state: AvailabilityState::from_columns(status, first_detected),
        recovered_at,
        recovery_source,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::Connection;

    use crate::db::{create_test_connection, initialize_database};

    pub fn migrated_connection() -> Connection {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_timestamp_causes_error() {
        assert!(parse_timestamp(0, "not-a-valid-timestamp").is_err());
    }

    #[test]
    fn test_negative_count_causes_error() {
        assert!(parse_optional_count(0, Some(-1)).is_err());
        assert_eq!(parse_optional_count(0, Some(7)).unwrap(), Some(7));
        assert_eq!(parse_optional_count(0, None).unwrap(), None);
    }
}
