use std::path::Path;

use crate::{
    error::Error,
    job::StrategyKind,
    stats::CommandStats,
    unit::{TransferUnit, UnitResult},
};

use super::{format_report, BackupReport, JobStatus};

fn report(strategy: StrategyKind, status: JobStatus, failures: Vec<UnitResult>) -> BackupReport {
    let mut stats = CommandStats::new();
    let timestamp = stats.end();
    BackupReport {
        strategy: Some(strategy),
        status,
        timestamp,
        failures,
        error: None,
        stats,
    }
}

fn failed_unit(relative: &str, message: &str) -> UnitResult {
    let root = Path::new("/srv/data");
    UnitResult::failure(TransferUnit::new(root, root.join(relative)), message)
}

#[test]
fn format_success() {
    let text = format_report(&report(StrategyKind::S3, JobStatus::Succeeded, vec![]));
    assert!(text.starts_with("Backup completed successfully at "));
    assert!(text.ends_with('.'));
}

#[test]
fn format_object_store_failures() {
    let mut report = report(
        StrategyKind::S3,
        JobStatus::Failed,
        vec![
            failed_unit("a/b.txt", "access denied"),
            failed_unit("c.txt", "timed out"),
        ],
    );
    report.stats.files_uploaded = 3;
    report.stats.files_failed = 2;

    let text = format_report(&report);
    let lines: Vec<_> = text.lines().collect();
    assert!(lines[0].starts_with("Backup failed at "));
    assert_eq!(lines[1], "2 of 5 files failed:");
    assert_eq!(lines[2], "  a/b.txt: access denied");
    assert_eq!(lines[3], "  c.txt: timed out");
}

#[test]
fn format_object_store_error_without_failures() {
    let mut report = report(StrategyKind::S3, JobStatus::Failed, vec![]);
    report.error = Some("task failed".to_owned());

    let text = format_report(&report);
    assert_eq!(text.lines().count(), 1);
    assert!(text.ends_with(": task failed"));
    assert!(!text.contains("files failed"));
}

#[test]
fn format_mirror_failure() {
    let mut report = report(
        StrategyKind::Remote,
        JobStatus::Failed,
        vec![failed_unit("", "Permission denied")],
    );
    let error = "mirror to `u@h:/d` failed (exit status: 255): Permission denied";
    report.error = Some(error.to_owned());

    let text = format_report(&report);
    assert_eq!(text.lines().count(), 1);
    assert!(text.ends_with(": mirror to `u@h:/d` failed (exit status: 255): Permission denied"));
}

#[test]
fn format_not_attempted() {
    let error = Error::UnknownStrategy("ftp".to_owned());
    let report = BackupReport::not_attempted(&error, CommandStats::new());

    assert!(!report.overall_success());
    assert!(!report.was_attempted());
    let text = format_report(&report);
    assert!(text.starts_with("No backup attempted at "));
    assert!(text.ends_with("backup strategy `ftp` is not recognized (expected `remote` or `s3`)"));
}

#[test]
fn report_serializes_to_json() {
    let report = report(
        StrategyKind::S3,
        JobStatus::Failed,
        vec![failed_unit("a/b.txt", "access denied")],
    );
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["strategy"], "s3");
    assert_eq!(value["status"], "failed");
    assert_eq!(value["failures"][0]["unit"]["relative_path"], "a/b.txt");
    assert_eq!(value["failures"][0]["outcome"]["status"], "failure");
    assert_eq!(value["failures"][0]["outcome"]["message"], "access denied");
}
