
use std::sync::Arc;

use chrono::Utc;
use log::debug;

use crate::{
    config::JobConfig,
    error::Error,
    job::{BackupJob, BucketTarget, RemoteTarget, Strategy, StrategyKind, TransferSettings},
    mirror::{mirror, MirrorRunner},
    report::{BackupReport, JobStatus},
    stats::CommandStats,
    storage::{LocalUploader, ObjectUploader, S3Uploader},
    unit::{TransferUnit, UnitResult},
    upload::upload,
};

/// Validates a job, runs exactly one strategy for it and always produces a
/// report. It does no transfer work of its own.
#[derive(Debug, Clone)]
pub struct Coordinator {
    mirror: Arc<dyn MirrorRunner>,
    uploader: Option<Arc<dyn ObjectUploader>>,
}

impl Coordinator {
    /// Object-store jobs get an uploader matching their target: S3, or plain
    /// files when a local store is configured.
    pub fn new(mirror: Arc<dyn MirrorRunner>) -> Self {
        Coordinator {
            mirror,
            uploader: None,
        }
    }

    /// Uses `uploader` for every object-store job.
    #[must_use]
    pub fn with_uploader(mut self, uploader: Arc<dyn ObjectUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub async fn run(&self, config: &JobConfig, settings: TransferSettings) -> BackupReport {
        let stats = CommandStats::new();
        match BackupJob::from_config(config, settings) {
            Ok(job) => self.execute(&job).await,
            Err(err) => BackupReport::not_attempted(&err, stats),
        }
    }

    pub async fn execute(&self, job: &BackupJob) -> BackupReport {
        debug!("backing up {} with {:?}", job.source_dir.display(), job.strategy);
        match &job.strategy {
            Strategy::RemoteMirror(target) => self.execute_mirror(job, target).await,
            Strategy::ObjectStore(target) => self.execute_upload(job, target).await,
        }
    }

    async fn execute_mirror(&self, job: &BackupJob, target: &RemoteTarget) -> BackupReport {
        let mut stats = CommandStats::new();
        let result = mirror(&*self.mirror, &job.source_dir, target, &job.settings).await;
        stats.end();
        let timestamp = Utc::now();

        let (status, failures, error) = match result {
            Ok(()) => (JobStatus::Succeeded, vec![], None),
            Err(err) => {
                let message = match &err {
                    Error::MirrorFailed { diagnostic, .. } => diagnostic.clone(),
                    other => other.to_string(),
                };
                let unit = TransferUnit::new(&job.source_dir, &job.source_dir);
                let failure = UnitResult::failure(unit, message);
                (JobStatus::Failed, vec![failure], Some(err.to_string()))
            }
        };

        BackupReport {
            strategy: Some(StrategyKind::Remote),
            status,
            timestamp,
            failures,
            error,
            stats,
        }
    }

    async fn execute_upload(&self, job: &BackupJob, target: &BucketTarget) -> BackupReport {
        let mut stats = CommandStats::new();
        let uploader = self.uploader_for(target);
        let result = upload(uploader, &job.source_dir, target, &job.settings).await;
        let timestamp = Utc::now();

        match result {
            Ok(outcome) => {
                let status = if outcome.is_success() {
                    JobStatus::Succeeded
                } else {
                    JobStatus::Failed
                };
                let failures = outcome
                    .results
                    .into_iter()
                    .filter(|result| !result.is_success())
                    .collect();

                BackupReport {
                    strategy: Some(StrategyKind::S3),
                    status,
                    timestamp,
                    failures,
                    error: None,
                    stats: outcome.stats,
                }
            }
            Err(err) => {
                stats.end();
                BackupReport {
                    strategy: Some(StrategyKind::S3),
                    status: JobStatus::Failed,
                    timestamp,
                    failures: vec![],
                    error: Some(err.to_string()),
                    stats,
                }
            }
        }
    }

    fn uploader_for(&self, target: &BucketTarget) -> Arc<dyn ObjectUploader> {
        if let Some(uploader) = &self.uploader {
            return uploader.clone();
        }

        match &target.local_store {
            Some(root) => Arc::new(LocalUploader::new(root)),
            None => Arc::new(S3Uploader::new()),
        }
    }
}
