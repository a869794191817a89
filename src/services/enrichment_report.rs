// src/services/enrichment_report.rs
//
// Enrichment Report
//
// Result of one enrichment run: summary counters plus one detail row per
// entity that was updated, deleted, skipped or failed. Built incrementally by
// `ReportBuilder` during the run and frozen by `finish()`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AvailabilityStatus, Channel, Video};

/// Summary counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub entities_processed: usize,
    pub entities_updated: usize,
    pub entities_deleted: usize,
    /// First "not found" lookups; no detail row is written for these
    pub entities_flagged: usize,
    pub entities_restored: usize,
    pub entities_skipped: usize,
    pub channels_created: usize,
    pub tags_created: usize,
    pub topic_associations: usize,
    pub categories_assigned: usize,
    pub errors: usize,
    /// Remote calls made
    pub quota_used: usize,
}

/// State of one entity before or after its pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub availability_status: AvailabilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailability_first_detected: Option<DateTime<Utc>>,
    pub enriched_at: Option<DateTime<Utc>>,
}

impl From<&Video> for EntitySnapshot {
    fn from(video: &Video) -> Self {
        Self {
            title: video.title.clone(),
            channel_id: video.channel_id.clone(),
            availability_status: video.availability.status(),
            unavailability_first_detected: video.availability.first_detected(),
            enriched_at: video.enriched_at,
        }
    }
}

impl From<&Channel> for EntitySnapshot {
    fn from(channel: &Channel) -> Self {
        Self {
            title: channel.title.clone(),
            channel_id: None,
            availability_status: channel.availability.status(),
            unavailability_first_detected: channel.availability.first_detected(),
            enriched_at: channel.enriched_at,
        }
    }
}

/// What was applied to one entity found by the remote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    pub tags_created: usize,
    pub topics_created: usize,
    pub category_assigned: bool,
    pub restored: bool,
    pub channel_created: bool,
}

/// One row per entity outcome. Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentDetail {
    Updated {
        entity_id: String,
        before: EntitySnapshot,
        after: EntitySnapshot,
        tags_created: usize,
        topics_created: usize,
        category_assigned: bool,
        restored: bool,
    },
    Deleted {
        entity_id: String,
        before: EntitySnapshot,
    },
    Error {
        entity_id: String,
        error: String,
    },
    Skipped {
        entity_id: String,
        reason: String,
    },
}

impl EnrichmentDetail {
    pub fn entity_id(&self) -> &str {
        match self {
            EnrichmentDetail::Updated { entity_id, .. }
            | EnrichmentDetail::Deleted { entity_id, .. }
            | EnrichmentDetail::Error { entity_id, .. }
            | EnrichmentDetail::Skipped { entity_id, .. } => entity_id,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            EnrichmentDetail::Updated { .. } => "updated",
            EnrichmentDetail::Deleted { .. } => "deleted",
            EnrichmentDetail::Error { .. } => "error",
            EnrichmentDetail::Skipped { .. } => "skipped",
        }
    }
}

/// Immutable run result
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    run_id: Uuid,
    timestamp: DateTime<Utc>,
    priority: String,
    dry_run: bool,
    summary: EnrichmentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    halted_reason: Option<String>,
    details: Vec<EnrichmentDetail>,
}

impl EnrichmentReport {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn priority(&self) -> &str {
        &self.priority
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn summary(&self) -> &EnrichmentSummary {
        &self.summary
    }

    pub fn halted_reason(&self) -> Option<&str> {
        self.halted_reason.as_deref()
    }

    pub fn details(&self) -> &[EnrichmentDetail] {
        &self.details
    }

    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// First detail row for `entity_id`
    pub fn detail_for(&self, entity_id: &str) -> Option<&EnrichmentDetail> {
        self.details.iter().find(|d| d.entity_id() == entity_id)
    }
}

/// Accumulates counters and detail rows while a run is in progress.
/// Every `record_*` call counts one processed entity.
#[derive(Debug)]
pub struct ReportBuilder {
    report: EnrichmentReport,
}

impl ReportBuilder {
    pub fn new(priority: &str, dry_run: bool) -> Self {
        Self {
            report: EnrichmentReport {
                run_id: Uuid::new_v4(),
                timestamp: Utc::now(),
                priority: priority.to_string(),
                dry_run,
                summary: EnrichmentSummary::default(),
                halted_reason: None,
                details: Vec::new(),
            },
        }
    }

    pub fn record_remote_call(&mut self) {
        self.report.summary.quota_used += 1;
    }

    pub fn record_updated(
        &mut self,
        entity_id: &str,
        before: EntitySnapshot,
        after: EntitySnapshot,
        changes: &AppliedChanges,
    ) {
        let summary = &mut self.report.summary;
        summary.entities_processed += 1;
        summary.entities_updated += 1;
        summary.tags_created += changes.tags_created;
        summary.topic_associations += changes.topics_created;
        if changes.category_assigned {
            summary.categories_assigned += 1;
        }
        if changes.restored {
            summary.entities_restored += 1;
        }
        if changes.channel_created {
            summary.channels_created += 1;
        }

        self.report.details.push(EnrichmentDetail::Updated {
            entity_id: entity_id.to_string(),
            before,
            after,
            tags_created: changes.tags_created,
            topics_created: changes.topics_created,
            category_assigned: changes.category_assigned,
            restored: changes.restored,
        });
    }

    /// Second consecutive miss: the entity is now unavailable
    pub fn record_deleted(&mut self, entity_id: &str, before: EntitySnapshot) {
        self.report.summary.entities_processed += 1;
        self.report.summary.entities_deleted += 1;
        self.report.details.push(EnrichmentDetail::Deleted {
            entity_id: entity_id.to_string(),
            before,
        });
    }

    /// First miss: counted, no detail row
    pub fn record_flagged(&mut self, _entity_id: &str) {
        self.report.summary.entities_processed += 1;
        self.report.summary.entities_flagged += 1;
    }

    pub fn record_error(&mut self, entity_id: &str, error: impl Into<String>) {
        self.report.summary.entities_processed += 1;
        self.report.summary.errors += 1;
        self.report.details.push(EnrichmentDetail::Error {
            entity_id: entity_id.to_string(),
            error: error.into(),
        });
    }

    pub fn record_skipped(&mut self, entity_id: &str, reason: impl Into<String>) {
        self.report.summary.entities_processed += 1;
        self.report.summary.entities_skipped += 1;
        self.report.details.push(EnrichmentDetail::Skipped {
            entity_id: entity_id.to_string(),
            reason: reason.into(),
        });
    }

    /// Stop reason; the first one wins
    pub fn halt(&mut self, reason: impl Into<String>) {
        if self.report.halted_reason.is_none() {
            self.report.halted_reason = Some(reason.into());
        }
    }

    pub fn summary(&self) -> &EnrichmentSummary {
        &self.report.summary
    }

    pub fn finish(self) -> EnrichmentReport {
        self.report
    }
}
