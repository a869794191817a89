// src/application/commands/status_commands.rs

use crate::application::cli::StatusArgs;
use crate::application::error_handling::ExitStatus;
use crate::application::state::AppState;
use crate::db::get_connection;
use crate::error::AppResult;
use crate::services::{EnrichmentStatus, EntityStores};

/// `vidledger status`: read-only, never touches the API
pub fn show_status(state: &AppState, args: StatusArgs) -> AppResult<ExitStatus> {
    let conn = get_connection(&state.pool)?;
    let status = EntityStores::sqlite().status(&conn, args.include_unavailable)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", render_status(&status));
    }

    Ok(ExitStatus::Clean)
}

pub fn render_status(status: &EnrichmentStatus) -> String {
    let mut out = format!(
        "Candidates{}:\n",
        if status.include_unavailable {
            " (including unavailable)"
        } else {
            ""
        }
    );
    for tier in &status.tiers {
        out.push_str(&format!(
            "  {:<8} {:>8} videos  ~{} API calls\n",
            tier.tier.label(),
            tier.candidates,
            tier.estimated_quota
        ));
    }
    out.push_str(&format!(
        "  {:<8} {:>8} channels ~{} API calls\n",
        "channels", status.channel_candidates, status.channel_quota
    ));

    let db = &status.database;
    out.push_str("Library:\n");
    out.push_str(&format!(
        "  videos:     {} ({} unavailable, {} flagged)\n",
        db.video_count, db.unavailable_video_count, db.flagged_video_count
    ));
    out.push_str(&format!(
        "  channels:   {} ({} unavailable)\n",
        db.channel_count, db.unavailable_channel_count
    ));
    out.push_str(&format!("  topics:     {}\n", db.topic_count));
    out.push_str(&format!("  categories: {}\n", db.category_count));
    out
}
