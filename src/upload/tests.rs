use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use chrono::NaiveDate;

use crate::{
    job::{BucketTarget, TransferSettings},
    storage::LocalUploader,
    testing::{write_tree, FakeUploader},
    unit::{UnitOutcome, UnitResult},
};

use super::{upload_on, UploadOutcome};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn target() -> BucketTarget {
    BucketTarget {
        bucket: "nightly".to_owned(),
        local_store: None,
    }
}

fn tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("a/b.txt", "bee"),
            ("a/c.txt", "sea"),
            ("d/e/f.bin", "eff"),
            ("g.txt", "gee"),
        ],
    );
    dir
}

async fn upload_default(uploader: Arc<FakeUploader>, source_dir: &Path) -> UploadOutcome {
    upload_on(date(), uploader, source_dir, &target(), &TransferSettings::default())
        .await
        .unwrap()
}

fn relative_paths<'a, I>(results: I) -> Vec<PathBuf>
where
    I: Iterator<Item = &'a UnitResult>,
{
    results.map(|result| result.unit.relative_path.clone()).collect()
}

#[tokio::test]
async fn upload_all_succeed() {
    let dir = tree();
    let uploader = Arc::new(FakeUploader::new());
    let outcome = upload_default(uploader.clone(), dir.path()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.results.len(), 4);
    assert_eq!(outcome.failures().count(), 0);
    assert_eq!(uploader.call_count(), 4);
    assert_eq!(outcome.stats.files_uploaded, 4);
    assert_eq!(outcome.stats.bytes_uploaded, 12);
}

#[tokio::test]
async fn upload_keys_use_run_date() {
    let dir = tree();
    let uploader = Arc::new(FakeUploader::new());
    upload_default(uploader.clone(), dir.path()).await;

    assert_eq!(
        uploader.keys(),
        vec![
            "2024-03-01/a/b.txt",
            "2024-03-01/a/c.txt",
            "2024-03-01/d/e/f.bin",
            "2024-03-01/g.txt",
        ]
    );
}

#[tokio::test]
async fn upload_continues_past_failures() {
    let dir = tree();
    let uploader = Arc::new(FakeUploader::failing(["a/b.txt", "d/e/f.bin"]));
    let outcome = upload_default(uploader.clone(), dir.path()).await;

    assert!(!outcome.is_success());
    assert_eq!(uploader.call_count(), 4);
    assert_eq!(
        relative_paths(outcome.failures()),
        vec![PathBuf::from("a/b.txt"), PathBuf::from("d/e/f.bin")]
    );
    assert_eq!(
        outcome.results[0].outcome,
        UnitOutcome::Failure("simulated failure for a/b.txt".to_owned())
    );
    assert_eq!(outcome.stats.files_uploaded, 2);
    assert_eq!(outcome.stats.files_failed, 2);
}

#[tokio::test]
async fn upload_every_unit_failing() {
    let dir = tree();
    let uploader = Arc::new(FakeUploader::failing([
        "a/b.txt",
        "a/c.txt",
        "d/e/f.bin",
        "g.txt",
    ]));
    let outcome = upload_default(uploader.clone(), dir.path()).await;

    assert_eq!(outcome.failures().count(), 4);
    assert_eq!(uploader.call_count(), 4);
}

#[tokio::test]
async fn upload_empty_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("empty")).unwrap();
    let uploader = Arc::new(FakeUploader::new());
    let outcome = upload_default(uploader.clone(), dir.path()).await;

    assert!(outcome.is_success());
    assert!(outcome.results.is_empty());
    assert_eq!(uploader.call_count(), 0);
}

#[tokio::test]
async fn upload_missing_source_dir() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = Arc::new(FakeUploader::new());
    let outcome = upload_on(
        date(),
        uploader.clone(),
        &dir.path().join("missing"),
        &target(),
        &TransferSettings::default(),
    )
    .await
    .unwrap();

    assert!(!outcome.is_success());
    assert_eq!(outcome.failures().count(), 1);
    assert_eq!(uploader.call_count(), 0);
}

#[tokio::test]
async fn upload_is_idempotent() {
    let dir = tree();
    let first = Arc::new(FakeUploader::new());
    let second = Arc::new(FakeUploader::new());
    let settings = TransferSettings::default();

    let a = upload_on(date(), first.clone(), dir.path(), &target(), &settings)
        .await
        .unwrap();
    let b = upload_on(date(), second.clone(), dir.path(), &target(), &settings)
        .await
        .unwrap();

    assert_eq!(first.keys(), second.keys());
    assert_eq!(a.results, b.results);
}

#[tokio::test]
async fn upload_sequential_by_default() {
    let dir = tree();
    let uploader = Arc::new(
        FakeUploader::new()
            .with_delay("a/b.txt", Duration::from_millis(20))
            .with_delay("a/c.txt", Duration::from_millis(20)),
    );
    upload_default(uploader.clone(), dir.path()).await;

    assert_eq!(uploader.max_in_flight(), 1);
}

#[tokio::test]
async fn upload_concurrent_keeps_order() {
    let dir = tree();
    let uploader = Arc::new(
        FakeUploader::failing(["d/e/f.bin"])
            .with_delay("a/b.txt", Duration::from_millis(60))
            .with_delay("a/c.txt", Duration::from_millis(30)),
    );
    let settings = TransferSettings {
        tasks: 4,
        ..TransferSettings::default()
    };
    let outcome = upload_on(date(), uploader.clone(), dir.path(), &target(), &settings)
        .await
        .unwrap();

    assert_eq!(
        relative_paths(outcome.results.iter()),
        vec![
            PathBuf::from("a/b.txt"),
            PathBuf::from("a/c.txt"),
            PathBuf::from("d/e/f.bin"),
            PathBuf::from("g.txt"),
        ]
    );
    assert_eq!(
        relative_paths(outcome.failures()),
        vec![PathBuf::from("d/e/f.bin")]
    );
    assert_eq!(uploader.call_count(), 4);
}

#[tokio::test]
async fn upload_timeout_fails_only_that_unit() {
    let dir = tree();
    let uploader =
        Arc::new(FakeUploader::new().with_delay("a/c.txt", Duration::from_secs(30)));
    let settings = TransferSettings {
        upload_timeout: Some(Duration::from_millis(20)),
        ..TransferSettings::default()
    };
    let outcome = upload_on(date(), uploader.clone(), dir.path(), &target(), &settings)
        .await
        .unwrap();

    let failures: Vec<_> = outcome.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].unit.relative_path, PathBuf::from("a/c.txt"));
    assert_eq!(failures[0].message(), Some("upload timed out after 20ms"));
    assert_eq!(uploader.call_count(), 4);
}

#[tokio::test]
async fn upload_dry_run() {
    let dir = tree();
    let uploader = Arc::new(FakeUploader::new());
    let settings = TransferSettings {
        dry_run: true,
        ..TransferSettings::default()
    };
    let outcome = upload_on(date(), uploader.clone(), dir.path(), &target(), &settings)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.results.len(), 4);
    assert_eq!(uploader.call_count(), 0);
    assert_eq!(outcome.stats.files_uploaded, 0);
    assert_eq!(outcome.stats.files_skipped, 4);
    assert_eq!(outcome.stats.bytes_uploaded, 0);
    assert_eq!(outcome.stats.files_total(), 4);
}

#[tokio::test]
async fn upload_to_local_store() {
    let dir = tree();
    let store = tempfile::tempdir().unwrap();
    let target = BucketTarget {
        bucket: "nightly".to_owned(),
        local_store: Some(store.path().to_owned()),
    };
    let uploader = Arc::new(LocalUploader::new(store.path()));
    let outcome = upload_on(date(), uploader, dir.path(), &target, &TransferSettings::default())
        .await
        .unwrap();

    assert!(outcome.is_success());
    let object = store.path().join("nightly/2024-03-01/d/e/f.bin");
    assert_eq!(fs::read_to_string(object).unwrap(), "eff");
}
