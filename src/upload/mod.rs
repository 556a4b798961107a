#[cfg(test)]
mod tests;

use std::{path::Path, sync::Arc, time::Duration};

use async_channel::Sender;
use chrono::{Local, NaiveDate};
use clap::builder::styling::AnsiColor;
use log::{debug, info, warn};
use tokio::{task::spawn_blocking, time::timeout};

use crate::{
    error::{Error, Result},
    format::{format_path, format_size},
    job::{BucketTarget, TransferSettings},
    keys,
    stats::CommandStats,
    storage::ObjectUploader,
    task::OrderedTasks,
    unit::{TransferUnit, UnitResult},
    walk::{TransferUnits, WalkFailure},
};

type WalkItem = std::result::Result<TransferUnit, WalkFailure>;

#[derive(Debug, Clone, Copy)]
enum Attempt {
    Uploaded(u64),
    Skipped,
    Failed,
}

#[derive(Debug)]
pub struct UploadOutcome {
    /// One entry per enumerated unit, in enumeration order.
    pub results: Vec<UnitResult>,
    pub stats: CommandStats,
}

impl UploadOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &UnitResult> {
        self.results.iter().filter(|result| !result.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(UnitResult::is_success)
    }
}

#[derive(Debug)]
struct UploadState {
    uploader: Arc<dyn ObjectUploader>,
    bucket: String,
    destination: String,
    date: NaiveDate,
    upload_timeout: Option<Duration>,
    dry_run: bool,
}

/// The date every key of a run is prefixed with.
pub fn run_date() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn upload(
    uploader: Arc<dyn ObjectUploader>,
    source_dir: &Path,
    target: &BucketTarget,
    settings: &TransferSettings,
) -> Result<UploadOutcome> {
    upload_on(run_date(), uploader, source_dir, target, settings).await
}

/// Uploads every file under `source_dir`, keyed under `date`. A failed unit
/// is recorded and the remaining units are still attempted.
pub async fn upload_on(
    date: NaiveDate,
    uploader: Arc<dyn ObjectUploader>,
    source_dir: &Path,
    target: &BucketTarget,
    settings: &TransferSettings,
) -> Result<UploadOutcome> {
    let mut stats = CommandStats::new();
    info!("Starting backup to S3 bucket: {}", target.bucket);

    let state = Arc::new(UploadState {
        uploader,
        bucket: target.bucket.clone(),
        destination: target.to_string(),
        date,
        upload_timeout: settings.upload_timeout,
        dry_run: settings.dry_run,
    });

    let (sender, receiver) = async_channel::bounded(settings.tasks.max(1));
    let walk_dir = source_dir.to_owned();
    let walker = spawn_blocking(move || enumerate(&walk_dir, &sender));

    let mut tasks = OrderedTasks::new(settings.tasks);
    while let Ok(item) = receiver.recv().await {
        match item {
            Ok(unit) => {
                let state = state.clone();
                tasks.spawn(upload_unit(state, unit)).await?;
            }
            Err(failure) => {
                let formatted_path = format_path(&failure.unit.local_path);
                warn!("Failed to read {formatted_path}: {}", failure.error);
                tasks.push_ready((UnitResult::from(failure), Attempt::Failed));
            }
        }
    }

    walker.await?;
    let attempts = tasks.join_all().await?;

    let mut results = Vec::with_capacity(attempts.len());
    for (result, attempt) in attempts {
        match attempt {
            Attempt::Uploaded(size) => stats.add_upload(size),
            Attempt::Skipped => stats.add_skipped(),
            Attempt::Failed => stats.add_failure(),
        }
        results.push(result);
    }

    stats.end();
    Ok(UploadOutcome { results, stats })
}

fn enumerate(source_dir: &Path, sender: &Sender<WalkItem>) {
    for item in TransferUnits::new(source_dir) {
        if sender.send_blocking(item).is_err() {
            break;
        }
    }
}

async fn upload_unit(state: Arc<UploadState>, unit: TransferUnit) -> (UnitResult, Attempt) {
    let formatted_path = format_path(&unit.local_path);
    let result = try_upload_unit(&state, &unit).await;
    match result {
        Ok((_, None)) => (UnitResult::success(unit), Attempt::Skipped),
        Ok((key, Some(size))) => {
            let destination = &state.destination;
            let formatted_size = format_size(size);
            let msg_style = AnsiColor::Blue.on_default();
            let size_style = AnsiColor::BrightBlack.on_default();
            debug!("{msg_style}uploaded{msg_style:#} {formatted_path} to {destination}/{key} {size_style}({formatted_size}){size_style:#}");
            (UnitResult::success(unit), Attempt::Uploaded(size))
        }
        Err(err) => {
            warn!("Failed to upload {formatted_path}: {err}");
            (UnitResult::failure(unit, err), Attempt::Failed)
        }
    }
}

/// Returns the key and the uploaded size, or no size when nothing was sent.
async fn try_upload_unit(
    state: &UploadState,
    unit: &TransferUnit,
) -> Result<(String, Option<u64>)> {
    let key = keys::object(state.date, &unit.relative_path)?;
    if state.dry_run {
        info!(
            "would upload {} to {}/{key}",
            format_path(&unit.local_path),
            state.destination
        );
        return Ok((key, None));
    }

    let upload = state.uploader.upload(&state.bucket, &key, &unit.local_path);
    let size = match state.upload_timeout {
        Some(limit) => timeout(limit, upload)
            .await
            .map_err(|_| Error::UploadTimedOut(limit))??,
        None => upload.await?,
    };

    Ok((key, Some(size)))
}
