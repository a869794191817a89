// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod availability_reconciler;
pub mod catalog_seeder;
pub mod derived_data_replacer;
pub mod enrichment_report;
pub mod enrichment_service;
pub mod topic_catalog;


// Re-export all services and their types
pub use availability_reconciler::{AvailabilityReconciler, Clock};

pub use catalog_seeder::{CatalogSeeder, SeedResult};

pub use derived_data_replacer::DerivedDataReplacer;

pub use enrichment_report::{
    AppliedChanges,
    EnrichmentDetail,
    EnrichmentReport,
    EnrichmentSummary,
    EntitySnapshot,
    ReportBuilder,
};

pub use enrichment_service::{
    estimate_quota,
    ChannelEnrichmentRequest,
    DerivedReplacers,
    EnrichmentRequest,
    EnrichmentService,
    EnrichmentStatus,
    EntityStores,
    TierStatus,
    BATCH_SIZE,
    CHANNEL_RUN_LABEL,
};

pub use topic_catalog::{CatalogSource, RemoteCategoryCatalog, StaticTopicCatalog};
