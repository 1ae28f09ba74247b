use crate::error::{ReportError, Result};
use crate::model::Report;
use std::fs;
use std::path::{Path, PathBuf};

/// What the UI shows when a download is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTicket {
    pub report_id: i64,
    pub file_name: String,
    pub notice: String,
}

/// Records a download request for `report`.
///
/// The repository holds metadata only, so there are no bytes to transfer;
/// callers that want something on disk use [`write_manifest`].
pub fn request_download(report: &Report) -> DownloadTicket {
    tracing::info!(id = report.id, name = %report.name, "download requested");
    DownloadTicket {
        report_id: report.id,
        file_name: report.name.clone(),
        notice: format!("Downloading {}", report.name),
    }
}

/// Exact (case-sensitive) name lookup.
pub fn find_by_name<'a>(reports: &'a [Report], name: &str) -> Result<&'a Report> {
    reports
        .iter()
        .find(|report| report.name == name)
        .ok_or_else(|| ReportError::NotFound(name.to_string()))
}

/// Writes the report's metadata as `<name>.json` into `dir`.
pub fn write_manifest(report: &Report, dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let path = dir.join(format!("{}.json", report.name));
    fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}
