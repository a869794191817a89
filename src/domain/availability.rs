// src/domain/availability.rs
//
// Availability lifecycle shared by videos and channels
//
// STATES:
// - Available: last lookup found the entity
// - Flagged: exactly one not-found lookup since the last hit
// - Unavailable: two consecutive not-found lookups (or set outside this engine)
//
// TRANSITIONS:
//   state        | not found            | found
//   -------------+----------------------+------------------------
//   Available    | Flagged (first miss) | Available
//   Flagged      | Unavailable          | Available (forgiven)
//   Unavailable  | Unavailable          | Available (restored)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::DomainError;

/// Provenance tag written to `recovery_source` when enrichment restores an entity.
pub const RECOVERY_SOURCE: &str = "api_enrichment";

/// Persisted availability column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityStatus::Available => write!(f, "available"),
            AvailabilityStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl FromStr for AvailabilityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            other => Err(DomainError::InvariantViolation(format!(
                "Unknown availability status '{}'",
                other
            ))),
        }
    }
}

/// Three-state confirmation machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AvailabilityState {
    Available,
    Flagged { first_detected: DateTime<Utc> },
    Unavailable,
}

impl AvailabilityState {
    /// Rebuild the state from the two persisted columns.
    ///
    /// An unavailable row that still carries a first-detection marker maps to
    /// `Unavailable`; the marker is dropped on the next write.
    pub fn from_columns(status: AvailabilityStatus, first_detected: Option<DateTime<Utc>>) -> Self {
        match (status, first_detected) {
            (AvailabilityStatus::Available, None) => AvailabilityState::Available,
            (AvailabilityStatus::Available, Some(first_detected)) => {
                AvailabilityState::Flagged { first_detected }
            }
            (AvailabilityStatus::Unavailable, _) => AvailabilityState::Unavailable,
        }
    }

    pub fn status(&self) -> AvailabilityStatus {
        match self {
            AvailabilityState::Available | AvailabilityState::Flagged { .. } => {
                AvailabilityStatus::Available
            }
            AvailabilityState::Unavailable => AvailabilityStatus::Unavailable,
        }
    }

    pub fn first_detected(&self) -> Option<DateTime<Utc>> {
        match self {
            AvailabilityState::Flagged { first_detected } => Some(*first_detected),
            _ => None,
        }
    }

    /// Next state after a not-found lookup.
    pub fn after_absence(self, now: DateTime<Utc>) -> (Self, AbsenceOutcome) {
        match self {
            AvailabilityState::Available => (
                AvailabilityState::Flagged { first_detected: now },
                AbsenceOutcome::FirstDetection,
            ),
            AvailabilityState::Flagged { .. } => {
                (AvailabilityState::Unavailable, AbsenceOutcome::Confirmed)
            }
            AvailabilityState::Unavailable => (
                AvailabilityState::Unavailable,
                AbsenceOutcome::AlreadyUnavailable,
            ),
        }
    }

    /// Next state after a lookup that returned a live record.
    pub fn after_presence(self) -> (Self, PresenceTransition) {
        match self {
            AvailabilityState::Available => {
                (AvailabilityState::Available, PresenceTransition::Unchanged)
            }
            AvailabilityState::Flagged { .. } => {
                (AvailabilityState::Available, PresenceTransition::Forgiven)
            }
            AvailabilityState::Unavailable => {
                (AvailabilityState::Available, PresenceTransition::Restored)
            }
        }
    }
}

/// Result of feeding one not-found lookup into the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsenceOutcome {
    /// First miss: marker set, status still available
    FirstDetection,
    /// Second consecutive miss: status now unavailable
    Confirmed,
    /// Entity was already unavailable; nothing changes
    AlreadyUnavailable,
}

impl AbsenceOutcome {
    pub fn is_confirmed(self) -> bool {
        matches!(self, AbsenceOutcome::Confirmed)
    }
}

/// Result of feeding one found lookup into the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceTransition {
    Unchanged,
    /// A single pending miss was cleared
    Forgiven,
    /// Unavailable entity came back
    Restored,
}

/// Availability state plus recovery provenance, embedded in every trackable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub state: AvailabilityState,
    pub recovered_at: Option<DateTime<Utc>>,
    pub recovery_source: Option<String>,
}

impl Default for Availability {
    fn default() -> Self {
        Self {
            state: AvailabilityState::Available,
            recovered_at: None,
            recovery_source: None,
        }
    }
}

impl Availability {
    pub fn status(&self) -> AvailabilityStatus {
        self.state.status()
    }

    pub fn is_unavailable(&self) -> bool {
        self.status() == AvailabilityStatus::Unavailable
    }

    pub fn first_detected(&self) -> Option<DateTime<Utc>> {
        self.state.first_detected()
    }

    /// What a miss would do, without touching the state.
    pub fn peek_absence(&self, now: DateTime<Utc>) -> AbsenceOutcome {
        self.state.after_absence(now).1
    }

    pub fn record_absence(&mut self, now: DateTime<Utc>) -> AbsenceOutcome {
        let (next, outcome) = self.state.after_absence(now);
        self.state = next;
        outcome
    }

    pub fn record_presence(&mut self, now: DateTime<Utc>, source: &str) -> PresenceTransition {
        let (next, transition) = self.state.after_presence();
        self.state = next;
        if transition == PresenceTransition::Restored {
            self.recovered_at = Some(now);
            self.recovery_source = Some(source.to_string());
        }
        transition
    }
}

/// An entity whose remote existence is tracked.
pub trait Trackable {
    fn entity_id(&self) -> &str;
    fn availability(&self) -> &Availability;
    fn availability_mut(&mut self) -> &mut Availability;
}

/// A trackable entity that can absorb the metadata the remote reports for it.
pub trait RemoteEntity: Trackable {
    type Metadata;

    fn apply_metadata(&mut self, metadata: &Self::Metadata, now: DateTime<Utc>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_two_consecutive_misses_confirm() {
        let now = Utc::now();
        let mut availability = Availability::default();

        assert_eq!(
            availability.record_absence(now),
            AbsenceOutcome::FirstDetection
        );
        assert_eq!(availability.status(), AvailabilityStatus::Available);
        assert_eq!(availability.first_detected(), Some(now));

        let later = now + Duration::days(1);
        assert_eq!(availability.record_absence(later), AbsenceOutcome::Confirmed);
        assert_eq!(availability.status(), AvailabilityStatus::Unavailable);
        assert_eq!(availability.first_detected(), None);
    }

    #[test]
    fn test_single_miss_is_forgiven() {
        let now = Utc::now();
        let mut availability = Availability::default();
        availability.record_absence(now);

        let transition = availability.record_presence(now, RECOVERY_SOURCE);

        assert_eq!(transition, PresenceTransition::Forgiven);
        assert_eq!(availability.state, AvailabilityState::Available);
        assert!(availability.recovered_at.is_none());

        // The next miss starts a fresh cycle instead of confirming
        assert_eq!(
            availability.record_absence(now),
            AbsenceOutcome::FirstDetection
        );
    }

    #[test]
    fn test_restoration_records_provenance() {
        let now = Utc::now();
        let mut availability = Availability {
            state: AvailabilityState::Unavailable,
            recovered_at: None,
            recovery_source: None,
        };

        let transition = availability.record_presence(now, RECOVERY_SOURCE);

        assert_eq!(transition, PresenceTransition::Restored);
        assert_eq!(availability.status(), AvailabilityStatus::Available);
        assert_eq!(availability.recovered_at, Some(now));
        assert_eq!(availability.recovery_source.as_deref(), Some(RECOVERY_SOURCE));
        assert!(availability.first_detected().is_none());
    }

    #[test]
    fn test_miss_on_unavailable_changes_nothing() {
        let mut availability = Availability {
            state: AvailabilityState::Unavailable,
            ..Availability::default()
        };
        let outcome = availability.record_absence(Utc::now());
        assert_eq!(outcome, AbsenceOutcome::AlreadyUnavailable);
        assert!(!outcome.is_confirmed());
        assert_eq!(availability.state, AvailabilityState::Unavailable);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let availability = Availability::default();
        assert_eq!(
            availability.peek_absence(Utc::now()),
            AbsenceOutcome::FirstDetection
        );
        assert_eq!(availability.state, AvailabilityState::Available);
    }

    #[test]
    fn test_unavailable_row_with_marker_maps_to_unavailable() {
        let state =
            AvailabilityState::from_columns(AvailabilityStatus::Unavailable, Some(Utc::now()));
        assert_eq!(state, AvailabilityState::Unavailable);
        assert_eq!(state.first_detected(), None);
    }

    #[test]
    fn test_available_row_with_marker_is_flagged() {
        let ts = Utc::now();
        let state = AvailabilityState::from_columns(AvailabilityStatus::Available, Some(ts));
        assert_eq!(state, AvailabilityState::Flagged { first_detected: ts });
        assert_eq!(state.status(), AvailabilityStatus::Available);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [AvailabilityStatus::Available, AvailabilityStatus::Unavailable] {
            assert_eq!(status.to_string().parse::<AvailabilityStatus>().unwrap(), status);
        }
        assert!("private".parse::<AvailabilityStatus>().is_err());
    }
}
