#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::Error,
    format::{format_path, format_time},
    job::StrategyKind,
    stats::CommandStats,
    unit::UnitResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Succeeded,
    Failed,
    /// The configuration was rejected before any transfer started.
    NotAttempted,
}

/// The outcome of one job execution.
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub strategy: Option<StrategyKind>,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
    /// Failed units in enumeration order. A failed mirror contributes a
    /// single entry for the whole tree.
    pub failures: Vec<UnitResult>,
    pub error: Option<String>,
    pub stats: CommandStats,
}

impl BackupReport {
    pub fn not_attempted(error: &Error, mut stats: CommandStats) -> Self {
        let timestamp = stats.end();
        BackupReport {
            strategy: None,
            status: JobStatus::NotAttempted,
            timestamp,
            failures: vec![],
            error: Some(error.to_string()),
            stats,
        }
    }

    pub fn overall_success(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    pub fn was_attempted(&self) -> bool {
        self.status != JobStatus::NotAttempted
    }
}

pub fn format_report(report: &BackupReport) -> String {
    let time = format_time(&report.timestamp);
    let error = report.error.as_deref().unwrap_or("unknown error");

    match report.status {
        JobStatus::Succeeded => format!("Backup completed successfully at {time}."),
        JobStatus::NotAttempted => format!("No backup attempted at {time}: {error}"),
        JobStatus::Failed => {
            let mut lines = vec![match &report.error {
                Some(error) => format!("Backup failed at {time}: {error}"),
                None => format!("Backup failed at {time}."),
            }];

            if report.strategy == Some(StrategyKind::S3) && !report.failures.is_empty() {
                let failed = report.failures.len();
                let total = report.stats.files_total();
                lines.push(format!("{failed} of {total} files failed:"));
                for failure in &report.failures {
                    let path = format_path(&failure.unit.relative_path);
                    let message = failure.message().unwrap_or_default();
                    lines.push(format!("  {path}: {message}"));
                }
            }

            lines.join("\n")
        }
    }
}
