// src/application/commands/enrichment_commands.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::cli::{ChannelArgs, RunArgs};
use crate::application::error_handling::ExitStatus;
use crate::application::report_writer::{default_report_path, write_report};
use crate::application::state::AppState;
use crate::db::get_connection;
use crate::domain::PriorityTier;
use crate::error::AppResult;
use crate::integrations::RemoteSource;
use crate::services::{
    ChannelEnrichmentRequest, EnrichmentReport, EnrichmentRequest, EnrichmentService,
};

/// `vidledger run`
pub async fn run_videos(state: &AppState, args: RunArgs) -> AppResult<ExitStatus> {
    // An unknown tier is rejected before anything else is opened
    let priority: PriorityTier = args.priority.parse()?;
    let remote = state.remote()?;
    execute_run(state, remote, priority, args).await
}

/// `vidledger channels`
pub async fn run_channels(state: &AppState, args: ChannelArgs) -> AppResult<ExitStatus> {
    let remote = state.remote()?;
    let mut conn = get_connection(&state.pool)?;
    let service = EnrichmentService::with_sqlite(remote).with_cancellation(state.shutdown.clone());

    let report = service
        .enrich_channels(
            &mut conn,
            ChannelEnrichmentRequest {
                limit: args.limit,
                include_unavailable: args.include_unavailable,
                dry_run: args.dry_run,
            },
        )
        .await?;

    publish_report(state, &report, args.output)
}

pub(crate) async fn execute_run(
    state: &AppState,
    remote: Arc<dyn RemoteSource>,
    priority: PriorityTier,
    args: RunArgs,
) -> AppResult<ExitStatus> {
    let mut conn = get_connection(&state.pool)?;
    let service = EnrichmentService::with_sqlite(remote).with_cancellation(state.shutdown.clone());

    let report = service
        .run(
            &mut conn,
            EnrichmentRequest {
                priority,
                limit: args.limit,
                include_unavailable: args.include_unavailable,
                dry_run: args.dry_run,
            },
        )
        .await?;

    publish_report(state, &report, args.output)
}

/// Print the summary, write the JSON artifact and pick the exit status
fn publish_report(
    state: &AppState,
    report: &EnrichmentReport,
    output: Option<PathBuf>,
) -> AppResult<ExitStatus> {
    print!("{}", render_summary(report));

    let path = output
        .unwrap_or_else(|| default_report_path(&state.config.export_dir, report.timestamp()));
    write_report(report, &path)?;
    println!("Report: {}", path.display());

    Ok(ExitStatus::from_report(report))
}

pub fn render_summary(report: &EnrichmentReport) -> String {
    let s = report.summary();
    let mut out = format!(
        "Enrichment run {} (priority: {}{})\n",
        report.run_id(),
        report.priority(),
        if report.dry_run() { ", dry run" } else { "" }
    );
    out.push_str(&format!("  processed:          {}\n", s.entities_processed));
    out.push_str(&format!("  updated:            {}\n", s.entities_updated));
    out.push_str(&format!("  flagged (1st miss): {}\n", s.entities_flagged));
    out.push_str(&format!("  now unavailable:    {}\n", s.entities_deleted));
    out.push_str(&format!("  restored:           {}\n", s.entities_restored));
    out.push_str(&format!("  skipped:            {}\n", s.entities_skipped));
    out.push_str(&format!("  channels created:   {}\n", s.channels_created));
    out.push_str(&format!("  tags written:       {}\n", s.tags_created));
    out.push_str(&format!("  topic links:        {}\n", s.topic_associations));
    out.push_str(&format!("  categories set:     {}\n", s.categories_assigned));
    out.push_str(&format!("  errors:             {}\n", s.errors));
    out.push_str(&format!("  API calls:          {}\n", s.quota_used));
    if let Some(reason) = report.halted_reason() {
        out.push_str(&format!("  halted:             {}\n", reason));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::{DomainError, Video};
    use crate::error::AppError;
    use crate::integrations::{FetchOutcome, MockRemoteSource};
    use crate::repositories::{SqliteVideoRepository, VideoRepository};

    fn state_in(dir: &std::path::Path) -> AppState {
        AppState::initialize(AppConfig {
            database_path: Some(dir.join("library.db")),
            export_dir: dir.join("exports"),
            ..AppConfig::default()
        })
        .unwrap()
    }

    fn run_args(priority: &str, output: Option<PathBuf>) -> RunArgs {
        RunArgs {
            priority: priority.to_string(),
            limit: None,
            dry_run: false,
            include_unavailable: false,
            output,
        }
    }

    #[tokio::test]
    async fn test_unknown_priority_is_rejected_before_api_key_check() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let err = run_videos(&state, run_args("urgent", None)).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::UnknownPriorityTier(_))
        ));
    }

    #[tokio::test]
    async fn test_run_writes_report_and_exits_clean() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        {
            let conn = get_connection(&state.pool).unwrap();
            SqliteVideoRepository::new()
                .create(&conn, &Video::placeholder("dQw4w9WgXcQ"))
                .unwrap();
        }
        let mut remote = MockRemoteSource::new();
        remote.expect_fetch_videos().times(1).returning(|ids| {
            Ok(FetchOutcome {
                found: Vec::new(),
                not_found: ids.to_vec(),
            })
        });
        let output = dir.path().join("out").join("report.json");

        let status = execute_run(
            &state,
            Arc::new(remote),
            PriorityTier::Low,
            run_args("low", Some(output.clone())),
        )
        .await
        .unwrap();

        assert_eq!(status, ExitStatus::Clean);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["summary"]["entities_flagged"], 1);
        assert_eq!(written["summary"]["quota_used"], 1);
    }

    #[test]
    fn test_summary_mentions_halt_reason() {
        let mut builder = crate::services::ReportBuilder::new("all", false);
        builder.halt("remote quota exhausted");
        let text = render_summary(&builder.finish());

        assert!(text.contains("priority: all"));
        assert!(text.contains("halted:             remote quota exhausted"));
    }
}
