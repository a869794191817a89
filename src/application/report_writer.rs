// src/application/report_writer.rs
//
// Writes an enrichment report as a pretty-printed JSON document.

use chrono::{DateTime, Utc};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppResult;
use crate::services::EnrichmentReport;

/// {export_dir}/enrichment-YYYYMMDD-HHMMSS.json
pub fn default_report_path(export_dir: &Path, timestamp: DateTime<Utc>) -> PathBuf {
    export_dir.join(format!("enrichment-{}.json", timestamp.format("%Y%m%d-%H%M%S")))
}

/// Write `report` to `path`, creating parent directories as needed
pub fn write_report(report: &EnrichmentReport, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;

    info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ReportBuilder;
    use chrono::TimeZone;

    #[test]
    fn test_default_path_is_timestamped() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let path = default_report_path(Path::new("exports"), timestamp);
        assert_eq!(path, PathBuf::from("exports/enrichment-20240309-070501.json"));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("nested").join("run.json");

        let mut builder = ReportBuilder::new("medium", true);
        builder.record_skipped("bad id", "malformed video id");
        let report = builder.finish();

        write_report(&report, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["priority"], "medium");
        assert_eq!(written["dry_run"], true);
        assert_eq!(written["summary"]["entities_skipped"], 1);
        assert_eq!(written["details"][0]["status"], "skipped");
        assert_eq!(written["run_id"], report.run_id().to_string());
    }
}
