// src/domain/catalog.rs
//
// Reference catalogs keyed by a stable external code.
// No availability lifecycle: rows are created, and only removed by a full force reseed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// A row in a reference catalog.
pub trait CatalogEntry {
    /// Stable external code (topic id, category id)
    fn code(&self) -> &str;

    fn name(&self) -> &str;

    /// Code of the parent row, for hierarchical catalogs
    fn parent_code(&self) -> Option<&str> {
        None
    }
}

/// A YouTube topic (Freebase id such as `/m/04rlf`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: String,
    pub name: String,
    pub parent_topic_id: Option<String>,
    pub topic_type: String,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(topic_id: &str, name: &str, parent_topic_id: Option<&str>) -> Self {
        Self {
            topic_id: topic_id.to_string(),
            name: name.to_string(),
            parent_topic_id: parent_topic_id.map(str::to_string),
            topic_type: "youtube".to_string(),
            created_at: Utc::now(),
        }
    }
}

impl CatalogEntry for Topic {
    fn code(&self) -> &str {
        &self.topic_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn parent_code(&self) -> Option<&str> {
        self.parent_topic_id.as_deref()
    }
}

/// A video category as published per region by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String,
    pub name: String,
    pub assignable: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(category_id: &str, name: &str, assignable: bool) -> Self {
        Self {
            category_id: category_id.to_string(),
            name: name.to_string(),
            assignable,
            created_at: Utc::now(),
        }
    }
}

impl CatalogEntry for Category {
    fn code(&self) -> &str {
        &self.category_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Code and name must be present; an entry cannot be its own parent.
pub fn validate_catalog_entry<E: CatalogEntry>(entry: &E) -> DomainResult<()> {
    if entry.code().trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Catalog code cannot be empty".to_string(),
        ));
    }
    if entry.name().trim().is_empty() {
        return Err(DomainError::InvariantViolation(format!(
            "Catalog entry {} has an empty name",
            entry.code()
        )));
    }
    if entry.parent_code() == Some(entry.code()) {
        return Err(DomainError::InvariantViolation(format!(
            "Catalog entry {} cannot be its own parent",
            entry.code()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_topic() {
        let topic = Topic::new("/m/04rlf", "Music", None);
        assert!(validate_catalog_entry(&topic).is_ok());
        assert_eq!(topic.code(), "/m/04rlf");
        assert_eq!(topic.parent_code(), None);
    }

    #[test]
    fn test_self_parent_rejected() {
        let topic = Topic::new("/m/04rlf", "Music", Some("/m/04rlf"));
        assert!(validate_catalog_entry(&topic).is_err());
    }

    #[test]
    fn test_empty_category_name_rejected() {
        let category = Category::new("10", "  ", true);
        assert!(validate_catalog_entry(&category).is_err());
    }
}
