// src/domain/mod.rs
//
// Domain Root - entities, value objects and invariants
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod availability;
pub mod catalog;
pub mod channel;
pub mod derived;
pub mod tier;
pub mod video;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use availability::{
    AbsenceOutcome, Availability, AvailabilityState, AvailabilityStatus, PresenceTransition,
    RemoteEntity, Trackable, RECOVERY_SOURCE,
};
pub use catalog::{validate_catalog_entry, CatalogEntry, Category, Topic};
pub use channel::{is_valid_channel_id, Channel, ChannelMetadata};
pub use derived::{DerivedValueRule, TAG_RULE, TOPIC_RULE};
pub use tier::PriorityTier;
pub use video::{is_valid_video_id, validate_video, Video, VideoMetadata};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid {field} value {value:?}: {reason}")]
    InvalidDerivedValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown priority tier '{0}' (expected low, medium, high or all)")]
    UnknownPriorityTier(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
