// src/services/enrichment_service.rs
//
// Enrichment Service - batch driver
//
// Selects candidates, fetches them from the remote in fixed-size batches and
// reconciles each one against what the remote returned.
//
// CRITICAL RULES:
// - One remote call per batch; the call completes before the batch transaction opens
// - One transaction per batch, committed once
// - One savepoint per entity; a failing entity rolls back alone and becomes an error row
// - "Not found" drives the availability machine; a failed call never does
// - Quota exhaustion and cancellation stop the run between batches
// - dry_run fetches for real but writes nothing

use log::{debug, error, info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::availability_reconciler::AvailabilityReconciler;
use super::derived_data_replacer::DerivedDataReplacer;
use super::enrichment_report::{
    AppliedChanges, EnrichmentReport, EntitySnapshot, ReportBuilder,
};
use crate::db::{get_database_stats, DatabaseStats};
use crate::domain::{
    is_valid_channel_id, is_valid_video_id, validate_video, AbsenceOutcome, Category, Channel,
    ChannelMetadata, PresenceTransition, PriorityTier, Topic, Trackable, Video, VideoMetadata,
};
use crate::error::{AppError, AppResult};
use crate::integrations::{FetchOutcome, RemoteError, RemoteSource};
use crate::repositories::{
    CatalogRepository, ChannelRepository, SqliteCategoryRepository, SqliteChannelRepository,
    SqliteTopicRepository, SqliteVideoRepository, VideoRepository,
};

/// Ids per remote call
pub const BATCH_SIZE: usize = 50;

/// Priority label used in channel run reports
pub const CHANNEL_RUN_LABEL: &str = "channels";

/// Remote calls needed to look up `candidates` entities
pub fn estimate_quota(candidates: usize) -> usize {
    candidates.div_ceil(BATCH_SIZE)
}

// ============================================================================
// REQUEST / STATUS TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentRequest {
    pub priority: PriorityTier,
    /// None means every candidate
    pub limit: Option<usize>,
    pub include_unavailable: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelEnrichmentRequest {
    pub limit: Option<usize>,
    pub include_unavailable: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierStatus {
    pub tier: PriorityTier,
    pub candidates: usize,
    pub estimated_quota: usize,
}

/// Read-only preview of what runs would cost
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentStatus {
    pub include_unavailable: bool,
    pub tiers: Vec<TierStatus>,
    pub channel_candidates: usize,
    pub channel_quota: usize,
    pub database: DatabaseStats,
}

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Persistence collaborators
#[derive(Clone)]
pub struct EntityStores {
    pub videos: Arc<dyn VideoRepository>,
    pub channels: Arc<dyn ChannelRepository>,
    pub topics: Arc<dyn CatalogRepository<Topic>>,
    pub categories: Arc<dyn CatalogRepository<Category>>,
}

impl EntityStores {
    pub fn sqlite() -> Self {
        Self {
            videos: Arc::new(SqliteVideoRepository::new()),
            channels: Arc::new(SqliteChannelRepository::new()),
            topics: Arc::new(SqliteTopicRepository::new()),
            categories: Arc::new(SqliteCategoryRepository::new()),
        }
    }

    /// Per-tier candidate counts and call estimates. Never calls the remote.
    pub fn status(&self, conn: &Connection, include_unavailable: bool) -> AppResult<EnrichmentStatus> {
        let tiers = PriorityTier::ORDERED
            .iter()
            .map(|&tier| {
                let candidates = self.videos.count_candidates(conn, tier, include_unavailable)?;
                Ok(TierStatus {
                    tier,
                    candidates,
                    estimated_quota: estimate_quota(candidates),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let channel_candidates = self.channels.count_candidates(conn, include_unavailable)?;

        Ok(EnrichmentStatus {
            include_unavailable,
            tiers,
            channel_candidates,
            channel_quota: estimate_quota(channel_candidates),
            database: get_database_stats(conn)?,
        })
    }
}

/// One replacer per derived set
#[derive(Clone)]
pub struct DerivedReplacers {
    pub video_tags: DerivedDataReplacer,
    pub video_topics: DerivedDataReplacer,
    pub channel_topics: DerivedDataReplacer,
}

impl Default for DerivedReplacers {
    fn default() -> Self {
        Self {
            video_tags: DerivedDataReplacer::video_tags(),
            video_topics: DerivedDataReplacer::video_topics(),
            channel_topics: DerivedDataReplacer::channel_topics(),
        }
    }
}

// ============================================================================
// RUN STATE
// ============================================================================

/// Result of one entity's pass, recorded only after its savepoint is released
enum EntityPass {
    Updated {
        before: EntitySnapshot,
        after: EntitySnapshot,
        changes: AppliedChanges,
        new_channel: Option<String>,
    },
    Absent {
        before: EntitySnapshot,
        outcome: AbsenceOutcome,
    },
}

struct RunState {
    report: ReportBuilder,
    dry_run: bool,
    /// Placeholder channels created (or that would be) during this run
    created_channels: HashSet<String>,
}

impl RunState {
    fn new(label: &str, dry_run: bool) -> Self {
        Self {
            report: ReportBuilder::new(label, dry_run),
            dry_run,
            created_channels: HashSet::new(),
        }
    }

    fn record(&mut self, entity_id: &str, pass: EntityPass) {
        match pass {
            EntityPass::Updated {
                before,
                after,
                changes,
                new_channel,
            } => {
                if let Some(channel_id) = new_channel {
                    self.created_channels.insert(channel_id);
                }
                self.report.record_updated(entity_id, before, after, &changes);
            }
            EntityPass::Absent { before, outcome } => match outcome {
                AbsenceOutcome::FirstDetection => self.report.record_flagged(entity_id),
                AbsenceOutcome::Confirmed => self.report.record_deleted(entity_id, before),
                AbsenceOutcome::AlreadyUnavailable => self
                    .report
                    .record_skipped(entity_id, "already unavailable; still not found"),
            },
        }
    }

    /// Every id of a failed call gets an error row. Returns true when the run must stop.
    fn record_batch_failure(&mut self, ids: &[String], err: &RemoteError) -> bool {
        error!("Remote lookup failed for a batch of {}: {}", ids.len(), err);
        for id in ids {
            self.report.record_error(id, err.to_string());
        }

        if err.is_quota_exhausted() {
            self.report.halt(format!("remote quota exhausted: {}", err));
            return true;
        }
        false
    }
}

// ============================================================================
// ENRICHMENT SERVICE
// ============================================================================

pub struct EnrichmentService {
    stores: EntityStores,
    remote: Arc<dyn RemoteSource>,
    reconciler: AvailabilityReconciler,
    replacers: DerivedReplacers,
    cancel: CancellationToken,
}

impl EnrichmentService {
    pub fn new(
        stores: EntityStores,
        remote: Arc<dyn RemoteSource>,
        reconciler: AvailabilityReconciler,
        replacers: DerivedReplacers,
    ) -> Self {
        Self {
            stores,
            remote,
            reconciler,
            replacers,
            cancel: CancellationToken::new(),
        }
    }

    /// SQLite stores and default replacers around `remote`
    pub fn with_sqlite(remote: Arc<dyn RemoteSource>) -> Self {
        Self::new(
            EntityStores::sqlite(),
            remote,
            AvailabilityReconciler::new(),
            DerivedReplacers::default(),
        )
    }

    /// Share an externally owned token (the binary cancels it on Ctrl-C)
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Cancelling this token stops the run before its next batch
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn status(&self, conn: &Connection, include_unavailable: bool) -> AppResult<EnrichmentStatus> {
        self.stores.status(conn, include_unavailable)
    }

    // ========================================================================
    // PUBLIC API: VIDEO RUN
    // ========================================================================

    pub async fn run(
        &self,
        conn: &mut Connection,
        request: EnrichmentRequest,
    ) -> AppResult<EnrichmentReport> {
        let candidates = self.stores.videos.query_candidates(
            conn,
            request.priority,
            request.limit,
            request.include_unavailable,
        )?;

        let mut state = RunState::new(request.priority.label(), request.dry_run);

        let (valid, malformed): (Vec<Video>, Vec<Video>) = candidates
            .into_iter()
            .partition(|v| is_valid_video_id(&v.video_id));
        for video in &malformed {
            warn!("Skipping malformed video id {:?}", video.video_id);
            state.report.record_skipped(&video.video_id, "malformed video id");
        }

        let batch_count = estimate_quota(valid.len());
        info!(
            "Enriching {} videos (tier {}, {} batches{})",
            valid.len(),
            request.priority,
            batch_count,
            if request.dry_run { ", dry run" } else { "" }
        );

        for (index, batch) in valid.chunks(BATCH_SIZE).enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Run cancelled before batch {}/{}", index + 1, batch_count);
                state
                    .report
                    .halt(format!("cancelled before batch {} of {}", index + 1, batch_count));
                break;
            }

            let ids: Vec<String> = batch.iter().map(|v| v.video_id.clone()).collect();
            debug!("Batch {}/{}: {} videos", index + 1, batch_count, ids.len());

            state.report.record_remote_call();
            let outcome = match self.remote.fetch_videos(&ids).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    if state.record_batch_failure(&ids, &e) {
                        break;
                    }
                    continue;
                }
            };

            self.apply_video_batch(conn, batch, outcome, &mut state)?;
        }

        Ok(finish_run(state))
    }

    fn apply_video_batch(
        &self,
        conn: &mut Connection,
        batch: &[Video],
        outcome: FetchOutcome<VideoMetadata>,
        state: &mut RunState,
    ) -> AppResult<()> {
        let found: HashMap<&str, &VideoMetadata> = outcome
            .found
            .iter()
            .map(|m| (m.video_id.as_str(), m))
            .collect();

        let mut tx = conn.transaction()?;

        for video in batch {
            let sp = tx.savepoint()?;

            let pass = match found.get(video.video_id.as_str()) {
                Some(metadata) => self.enrich_video(&sp, video.clone(), metadata, state),
                None => self.mark_absent(&sp, video.clone(), state.dry_run, |conn, v| {
                    self.stores.videos.update(conn, v)
                }),
            };

            match pass {
                Ok(pass) => {
                    sp.commit()?;
                    state.record(&video.video_id, pass);
                }
                Err(e) => {
                    warn!("Failed to process video {}: {}", video.video_id, e);
                    state.report.record_error(&video.video_id, e.to_string());
                }
            }
        }

        close_batch(tx, state.dry_run)
    }

    fn enrich_video(
        &self,
        conn: &Connection,
        mut video: Video,
        metadata: &VideoMetadata,
        state: &RunState,
    ) -> AppResult<EntityPass> {
        let before = EntitySnapshot::from(&video);
        let transition = self.reconciler.reconcile_presence(&mut video, metadata);
        let mut changes = AppliedChanges {
            restored: transition == PresenceTransition::Restored,
            ..AppliedChanges::default()
        };

        video.category_id = match &metadata.category_id {
            Some(id) if self.stores.categories.exists(conn, id)? => Some(id.clone()),
            Some(id) => {
                warn!(
                    "Video {}: category {} is not in the catalog; left unassigned",
                    video.video_id, id
                );
                None
            }
            None => None,
        };
        changes.category_assigned = video.category_id.is_some();

        let topics = self.known_topics(conn, &video.video_id, &metadata.topic_ids)?;

        // Reject bad values before anything is written
        validate_video(&video)?;
        self.replacers.video_tags.validate(&metadata.tags)?;
        self.replacers.video_topics.validate(&topics)?;

        let mut new_channel = None;
        if let Some(channel_id) = &video.channel_id {
            if !state.created_channels.contains(channel_id)
                && !self.stores.channels.exists(conn, channel_id)?
            {
                if !state.dry_run {
                    let placeholder = Channel::placeholder(channel_id, metadata.channel_title.clone());
                    self.stores.channels.create(conn, &placeholder)?;
                }
                info!("Created placeholder channel {} for video {}", channel_id, video.video_id);
                changes.channel_created = true;
                new_channel = Some(channel_id.clone());
            }
        }

        if !state.dry_run {
            self.stores.videos.update(conn, &video)?;
        }

        changes.tags_created =
            self.replacers
                .video_tags
                .replace(conn, &video.video_id, &metadata.tags, state.dry_run)?;
        changes.topics_created =
            self.replacers
                .video_topics
                .replace(conn, &video.video_id, &topics, state.dry_run)?;

        Ok(EntityPass::Updated {
            before,
            after: EntitySnapshot::from(&video),
            changes,
            new_channel,
        })
    }

    // ========================================================================
    // PUBLIC API: CHANNEL RUN
    // ========================================================================

    pub async fn enrich_channels(
        &self,
        conn: &mut Connection,
        request: ChannelEnrichmentRequest,
    ) -> AppResult<EnrichmentReport> {
        let candidates =
            self.stores
                .channels
                .query_candidates(conn, request.limit, request.include_unavailable)?;

        let mut state = RunState::new(CHANNEL_RUN_LABEL, request.dry_run);

        let (valid, malformed): (Vec<Channel>, Vec<Channel>) = candidates
            .into_iter()
            .partition(|c| is_valid_channel_id(&c.channel_id));
        for channel in &malformed {
            warn!("Skipping malformed channel id {:?}", channel.channel_id);
            state.report.record_skipped(&channel.channel_id, "malformed channel id");
        }

        let batch_count = estimate_quota(valid.len());
        info!(
            "Enriching {} channels ({} batches{})",
            valid.len(),
            batch_count,
            if request.dry_run { ", dry run" } else { "" }
        );

        for (index, batch) in valid.chunks(BATCH_SIZE).enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Run cancelled before batch {}/{}", index + 1, batch_count);
                state
                    .report
                    .halt(format!("cancelled before batch {} of {}", index + 1, batch_count));
                break;
            }

            let ids: Vec<String> = batch.iter().map(|c| c.channel_id.clone()).collect();
            debug!("Batch {}/{}: {} channels", index + 1, batch_count, ids.len());

            state.report.record_remote_call();
            let outcome = match self.remote.fetch_channels(&ids).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    if state.record_batch_failure(&ids, &e) {
                        break;
                    }
                    continue;
                }
            };

            self.apply_channel_batch(conn, batch, outcome, &mut state)?;
        }

        Ok(finish_run(state))
    }

    fn apply_channel_batch(
        &self,
        conn: &mut Connection,
        batch: &[Channel],
        outcome: FetchOutcome<ChannelMetadata>,
        state: &mut RunState,
    ) -> AppResult<()> {
        let found: HashMap<&str, &ChannelMetadata> = outcome
            .found
            .iter()
            .map(|m| (m.channel_id.as_str(), m))
            .collect();

        let mut tx = conn.transaction()?;

        for channel in batch {
            let sp = tx.savepoint()?;

            let pass = match found.get(channel.channel_id.as_str()) {
                Some(metadata) => self.enrich_channel(&sp, channel.clone(), metadata, state.dry_run),
                None => self.mark_absent(&sp, channel.clone(), state.dry_run, |conn, c| {
                    self.stores.channels.update(conn, c)
                }),
            };

            match pass {
                Ok(pass) => {
                    sp.commit()?;
                    state.record(&channel.channel_id, pass);
                }
                Err(e) => {
                    warn!("Failed to process channel {}: {}", channel.channel_id, e);
                    state.report.record_error(&channel.channel_id, e.to_string());
                }
            }
        }

        close_batch(tx, state.dry_run)
    }

    fn enrich_channel(
        &self,
        conn: &Connection,
        mut channel: Channel,
        metadata: &ChannelMetadata,
        dry_run: bool,
    ) -> AppResult<EntityPass> {
        let before = EntitySnapshot::from(&channel);
        let transition = self.reconciler.reconcile_presence(&mut channel, metadata);

        let topics = self.known_topics(conn, &channel.channel_id, &metadata.topic_ids)?;
        self.replacers.channel_topics.validate(&topics)?;

        if !dry_run {
            self.stores.channels.update(conn, &channel)?;
        }

        let topics_created =
            self.replacers
                .channel_topics
                .replace(conn, &channel.channel_id, &topics, dry_run)?;

        Ok(EntityPass::Updated {
            before,
            after: EntitySnapshot::from(&channel),
            changes: AppliedChanges {
                topics_created,
                restored: transition == PresenceTransition::Restored,
                ..AppliedChanges::default()
            },
            new_channel: None,
        })
    }

    // ========================================================================
    // INTERNAL: shared steps
    // ========================================================================

    /// Feed one "not found" into the entity's availability machine and persist it.
    fn mark_absent<E, F>(
        &self,
        conn: &Connection,
        mut entity: E,
        dry_run: bool,
        persist: F,
    ) -> AppResult<EntityPass>
    where
        E: Trackable,
        for<'a> EntitySnapshot: From<&'a E>,
        F: Fn(&Connection, &E) -> AppResult<()>,
    {
        let before = EntitySnapshot::from(&entity);
        let outcome = self.reconciler.reconcile_absence(&mut entity, dry_run);

        // Written even when nothing changed, so a stale first-detection marker is cleared
        if !dry_run {
            persist(conn, &entity)?;
        }

        Ok(EntityPass::Absent { before, outcome })
    }

    /// Topic ids present in the catalog, in remote order. Unknown ids are dropped.
    fn known_topics(
        &self,
        conn: &Connection,
        owner_id: &str,
        topic_ids: &[String],
    ) -> AppResult<Vec<String>> {
        let mut known = Vec::with_capacity(topic_ids.len());
        for topic_id in topic_ids {
            if known.contains(topic_id) {
                continue;
            }
            if self.stores.topics.exists(conn, topic_id)? {
                known.push(topic_id.clone());
            } else {
                warn!("{}: topic {} is not in the catalog; dropped", owner_id, topic_id);
            }
        }
        Ok(known)
    }
}

fn close_batch(tx: rusqlite::Transaction<'_>, dry_run: bool) -> AppResult<()> {
    if dry_run {
        tx.rollback()?;
    } else {
        tx.commit()
            .map_err(|e| AppError::Other(format!("Failed to commit batch: {}", e)))?;
    }
    Ok(())
}

fn finish_run(state: RunState) -> EnrichmentReport {
    let summary = *state.report.summary();
    info!(
        "Run finished: {} processed, {} updated, {} flagged, {} deleted, {} errors, {} calls",
        summary.entities_processed,
        summary.entities_updated,
        summary.entities_flagged,
        summary.entities_deleted,
        summary.errors,
        summary.quota_used
    );
    state.report.finish()
}
