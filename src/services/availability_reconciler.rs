// src/services/availability_reconciler.rs
//
// Availability Reconciler
//
// Feeds one remote lookup outcome into an entity's availability machine.
//
// CRITICAL RULES:
// - Only a "not found" lookup counts as absence; transport failures never reach here
// - UNAVAILABLE requires two consecutive absences
// - Any presence restores, whatever put the entity in UNAVAILABLE
// - Stages changes on the entity only; the caller persists and commits

use chrono::{DateTime, Utc};
use log::info;
use std::sync::Arc;

use crate::domain::{AbsenceOutcome, PresenceTransition, RemoteEntity, Trackable, RECOVERY_SOURCE};

/// Time source, replaceable in tests
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct AvailabilityReconciler {
    clock: Clock,
}

impl Default for AvailabilityReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityReconciler {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    /// Record one "not found" lookup.
    ///
    /// The first miss sets the detection marker and leaves the status alone;
    /// the second consecutive miss confirms unavailability and clears the marker.
    /// With `dry_run` the outcome is computed but the entity is left untouched.
    pub fn reconcile_absence<E: Trackable>(&self, entity: &mut E, dry_run: bool) -> AbsenceOutcome {
        let now = (self.clock)();

        if dry_run {
            return entity.availability().peek_absence(now);
        }

        let outcome = entity.availability_mut().record_absence(now);
        match outcome {
            AbsenceOutcome::FirstDetection => {
                info!("{} not found; flagged for confirmation", entity.entity_id())
            }
            AbsenceOutcome::Confirmed => {
                info!("{} not found twice in a row; marked unavailable", entity.entity_id())
            }
            AbsenceOutcome::AlreadyUnavailable => {}
        }
        outcome
    }

    /// Record one lookup that returned a live record and apply its metadata.
    ///
    /// Metadata is refreshed on every call, not only on state transitions.
    pub fn reconcile_presence<E: RemoteEntity>(
        &self,
        entity: &mut E,
        metadata: &E::Metadata,
    ) -> PresenceTransition {
        let now = (self.clock)();

        let transition = entity
            .availability_mut()
            .record_presence(now, RECOVERY_SOURCE);
        match transition {
            PresenceTransition::Restored => {
                info!("{} is available again", entity.entity_id())
            }
            PresenceTransition::Forgiven => {
                info!("{} found again; pending unavailability cleared", entity.entity_id())
            }
            PresenceTransition::Unchanged => {}
        }

        entity.apply_metadata(metadata, now);
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AvailabilityState, AvailabilityStatus, Video, VideoMetadata};
    use chrono::TimeZone;

    fn fixed_clock() -> Clock {
        Arc::new(|| Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "Never Gonna Give You Up".to_string(),
            ..VideoMetadata::default()
        }
    }

    #[test]
    fn test_absence_twice_confirms_on_second_call_only() {
        let reconciler = AvailabilityReconciler::with_clock(fixed_clock());
        let mut video = Video::placeholder("dQw4w9WgXcQ");

        let first = reconciler.reconcile_absence(&mut video, false);
        assert!(!first.is_confirmed());
        assert_eq!(video.availability.status(), AvailabilityStatus::Available);
        assert_eq!(
            video.availability.first_detected(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );

        let second = reconciler.reconcile_absence(&mut video, false);
        assert!(second.is_confirmed());
        assert_eq!(video.availability.status(), AvailabilityStatus::Unavailable);
        assert!(video.availability.first_detected().is_none());
    }

    #[test]
    fn test_dry_run_reports_without_mutating() {
        let reconciler = AvailabilityReconciler::new();
        let mut video = Video::placeholder("dQw4w9WgXcQ");
        reconciler.reconcile_absence(&mut video, false);
        let flagged = video.clone();

        let outcome = reconciler.reconcile_absence(&mut video, true);

        assert!(outcome.is_confirmed());
        assert_eq!(video, flagged);
    }

    #[test]
    fn test_presence_after_one_absence_forgives() {
        let reconciler = AvailabilityReconciler::new();
        let mut video = Video::placeholder("dQw4w9WgXcQ");
        reconciler.reconcile_absence(&mut video, false);

        let transition = reconciler.reconcile_presence(&mut video, &metadata());

        assert_eq!(transition, PresenceTransition::Forgiven);
        assert_eq!(video.availability.state, AvailabilityState::Available);
        assert!(video.availability.recovered_at.is_none());

        // Next miss starts over
        assert!(!reconciler.reconcile_absence(&mut video, false).is_confirmed());
    }

    #[test]
    fn test_presence_restores_unavailable_with_provenance() {
        let reconciler = AvailabilityReconciler::with_clock(fixed_clock());
        let mut video = Video::placeholder("dQw4w9WgXcQ");
        video.availability.state = AvailabilityState::Unavailable;

        let transition = reconciler.reconcile_presence(&mut video, &metadata());

        assert_eq!(transition, PresenceTransition::Restored);
        assert_eq!(video.availability.status(), AvailabilityStatus::Available);
        assert_eq!(
            video.availability.recovered_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(video.availability.recovery_source.as_deref(), Some(RECOVERY_SOURCE));
        assert!(video.availability.first_detected().is_none());
    }

    #[test]
    fn test_presence_always_refreshes_metadata() {
        let reconciler = AvailabilityReconciler::new();
        let mut video = Video::placeholder("dQw4w9WgXcQ");

        let transition = reconciler.reconcile_presence(&mut video, &metadata());

        assert_eq!(transition, PresenceTransition::Unchanged);
        assert_eq!(video.title.as_deref(), Some("Never Gonna Give You Up"));
        assert!(video.enriched_at.is_some());
    }
}
