// src/domain/derived.rs
//
// Constraints on values stored in one-to-many derived sets (tags, topic ids).
// Checked before any destructive write so a rejected set never clears the old one.

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedValueRule {
    pub field: &'static str,
    pub max_len: usize,
}

/// YouTube caps a single tag at 500 characters
pub const TAG_RULE: DerivedValueRule = DerivedValueRule {
    field: "tag",
    max_len: 500,
};

pub const TOPIC_RULE: DerivedValueRule = DerivedValueRule {
    field: "topic_id",
    max_len: 50,
};

impl DerivedValueRule {
    pub fn validate(&self, value: &str) -> DomainResult<()> {
        if value.trim().is_empty() {
            return Err(DomainError::InvalidDerivedValue {
                field: self.field,
                value: value.to_string(),
                reason: "value cannot be blank".to_string(),
            });
        }

        let len = value.chars().count();
        if len > self.max_len {
            return Err(DomainError::InvalidDerivedValue {
                field: self.field,
                value: value.chars().take(32).collect(),
                reason: format!("length {} exceeds maximum {}", len, self.max_len),
            });
        }

        Ok(())
    }

    pub fn validate_all<S: AsRef<str>>(&self, values: &[S]) -> DomainResult<()> {
        values.iter().try_for_each(|v| self.validate(v.as_ref()))
    }
}
