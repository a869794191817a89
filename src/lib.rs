// src/lib.rs
// vidledger - enrichment and availability reconciliation for a local video library
//
// Architecture:
// - Domain-centric: entities, the availability machine and invariants live in `domain`
// - Repositories are dumb mappers over the caller's connection
// - Services own every unit of work (batch transaction, per-entity savepoint)
// - Explicit: a remote "not found" is never inferred from a failed call
// - Application layer: CLI boundary

pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod integrations;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    AbsenceOutcome, Availability, AvailabilityState, AvailabilityStatus, Category, Channel,
    ChannelMetadata, DomainError, PresenceTransition, PriorityTier, Topic, Video, VideoMetadata,
};

// ============================================================================
// PUBLIC API - Errors and configuration
// ============================================================================

pub use config::AppConfig;
pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{FetchOutcome, RemoteError, RemoteSource, YouTubeClient};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    estimate_quota, AvailabilityReconciler, CatalogSeeder, ChannelEnrichmentRequest,
    DerivedDataReplacer, EnrichmentReport, EnrichmentRequest, EnrichmentService,
    EnrichmentStatus, EnrichmentSummary, SeedResult, BATCH_SIZE,
};
