//! Export of the last analytics snapshot to CSV or JSON files

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsSnapshot;
use crate::error::{Error, Result};
use crate::types::UserAggregate;

/// CSV header row.
pub const CSV_HEADER: &str = "Username,Posts,Likes,Views";

/// Output format for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Serialize a snapshot in this format.
    pub fn render(&self, snapshot: &AnalyticsSnapshot) -> Result<String> {
        match self {
            ExportFormat::Csv => Ok(export_csv(snapshot)),
            ExportFormat::Json => export_json(snapshot),
        }
    }

    /// File name for an export taken at `now`.
    ///
    /// `clubboard-analytics-<period>-<YYYYMMDD-HHMMSS>.<ext>`
    pub fn file_name(&self, snapshot: &AnalyticsSnapshot, now: DateTime<Utc>) -> String {
        format!(
            "clubboard-analytics-{}-{}.{}",
            snapshot.period,
            now.format("%Y%m%d-%H%M%S"),
            self.extension()
        )
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::Export(format!("unknown export format: {other:?}"))),
        }
    }
}

/// Per-user table as CSV.
///
/// The header is bare; every data field is double-quoted with embedded
/// quotes doubled. Rows follow snapshot order and are joined by `\n`.
pub fn export_csv(snapshot: &AnalyticsSnapshot) -> String {
    let mut lines = Vec::with_capacity(snapshot.users.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for user in &snapshot.users {
        let fields = [
            quote(&user.username),
            quote(&user.posts.to_string()),
            quote(&user.likes.to_string()),
            quote(&user.views.to_string()),
        ];
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

/// Full snapshot (filters, timestamp, users, events) as pretty JSON.
pub fn export_json(snapshot: &AnalyticsSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Where exports land when no directory is configured.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Render `snapshot` and write it into `dir`, returning the file path.
pub fn save(
    dir: &Path,
    format: ExportFormat,
    snapshot: &AnalyticsSnapshot,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let body = format.render(snapshot)?;

    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Export(format!("failed to create {}: {}", dir.display(), e)))?;

    let path = dir.join(format.file_name(snapshot, now));
    std::fs::write(&path, body)
        .map_err(|e| Error::Export(format!("failed to write {}: {}", path.display(), e)))?;

    tracing::info!(
        path = %path.display(),
        format = %format,
        users = snapshot.users.len(),
        "Analytics exported"
    );

    Ok(path)
}

/// Write leaderboard rows to `path` in the snapshot shape `parse_snapshot` reads.
pub fn write_snapshot(path: &Path, rows: &[UserAggregate]) -> Result<()> {
    let body = serde_json::to_string_pretty(rows)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Export(format!("failed to create {}: {}", parent.display(), e)))?;
    }
    std::fs::write(path, body)
        .map_err(|e| Error::Export(format!("failed to write {}: {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), rows = rows.len(), "Leaderboard snapshot written");
    Ok(())
}
