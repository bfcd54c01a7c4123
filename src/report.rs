//! JSON report files for a scope's tally.
use crate::tally::Tally;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Serialize `tally` compactly and create or overwrite `out_dir/report_name`.
pub fn write_report(
    tally: &Tally,
    out_dir: &Path,
    report_name: &str,
    echo: bool,
) -> Result<PathBuf> {
    let json = serde_json::to_string(tally).context("serialize tally")?;
    if echo {
        tracing::info!(report = report_name, json = %json, "report contents");
    }
    let path = out_dir.join(report_name);
    fs::write(&path, json.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Like [`write_report`], but a failure is logged instead of returned so the
/// remaining scopes still get their reports.
pub fn write_report_logged(tally: &Tally, out_dir: &Path, report_name: &str, echo: bool) -> bool {
    match write_report(tally, out_dir, report_name, echo) {
        Ok(path) => {
            tracing::info!(report = report_name, path = %path.display(), "wrote report");
            true
        }
        Err(err) => {
            tracing::warn!(
                report = report_name,
                error = %format!("{err:#}"),
                "could not write report"
            );
            false
        }
    }
}
