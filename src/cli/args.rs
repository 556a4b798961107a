use std::{ops::RangeInclusive, path::PathBuf, time::Duration};

use clap::{ArgAction, Args};
use concolor_clap::ColorChoice;
use humantime::parse_duration;

use crate::{config::JobConfig, job::TransferSettings, mirror::DEFAULT_RSYNC_PROGRAM};

use super::parse::parse_range_inclusive;

const TASK_COUNT_RANGE: RangeInclusive<usize> = 1..=1024;
const DEFAULT_TASK_COUNT: usize = 1;

fn parse_task_count(s: &str) -> Result<usize, String> {
    parse_range_inclusive(s, TASK_COUNT_RANGE)
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Directory to back up
    #[arg(value_name = "SOURCE")]
    pub source_dir: Option<PathBuf>,

    /// Backup strategy ('remote' or 's3')
    #[arg(short = 's', long, value_name = "STRATEGY")]
    pub strategy: Option<String>,

    /// JSON job file; command-line options and environment variables take precedence
    #[arg(short = 'f', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub remote: RemoteArgs,

    #[command(flatten)]
    pub bucket: BucketArgs,

    /// Number of files to upload at once
    #[arg(
        short = 'j',
        long,
        value_name = "NUM",
        default_value_t = DEFAULT_TASK_COUNT,
        value_parser = parse_task_count,
    )]
    pub tasks: usize,

    /// Show operations that would be performed without actually doing them
    #[arg(short = 'n', long, default_value_t = false)]
    pub dry_run: bool,

    /// Kill the mirror process after this long (e.g. '2h')
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub mirror_timeout: Option<Duration>,

    /// Give up on a single upload after this long (e.g. '5m')
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub upload_timeout: Option<Duration>,

    /// rsync executable to run for remote backups
    #[arg(long, value_name = "PATH", default_value = DEFAULT_RSYNC_PROGRAM)]
    pub rsync: PathBuf,

    #[command(flatten)]
    pub global: GlobalArgs,
}

impl BackupArgs {
    pub fn job_config(&self) -> JobConfig {
        JobConfig {
            strategy: self.strategy.clone(),
            source_dir: self.source_dir.clone(),
            remote_user: self.remote.remote_user.clone(),
            remote_host: self.remote.remote_host.clone(),
            remote_dir: self.remote.remote_dir.clone(),
            remote_shell: self.remote.remote_shell.clone(),
            bucket_name: self.bucket.bucket.clone(),
            local_store: self.bucket.local_store.clone(),
        }
    }

    pub fn settings(&self) -> TransferSettings {
        TransferSettings {
            tasks: self.tasks,
            dry_run: self.dry_run,
            mirror_timeout: self.mirror_timeout,
            upload_timeout: self.upload_timeout,
        }
    }
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Remote options")]
pub struct RemoteArgs {
    /// User to log in as on the remote host
    #[arg(long, value_name = "USER")]
    pub remote_user: Option<String>,

    /// Host to mirror to
    #[arg(long, value_name = "HOST")]
    pub remote_host: Option<String>,

    /// Directory on the remote host
    #[arg(long, value_name = "DIR")]
    pub remote_dir: Option<String>,

    /// Remote shell command (default 'ssh')
    #[arg(long, value_name = "COMMAND")]
    pub remote_shell: Option<String>,
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Object store options")]
pub struct BucketArgs {
    /// Destination bucket
    #[arg(short = 'b', long, value_name = "BUCKET")]
    pub bucket: Option<String>,

    /// Write objects under this directory instead of S3
    #[arg(long, value_name = "DIR")]
    pub local_store: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Print stats after completion
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    #[command(flatten)]
    pub logger: LoggerArgs,
}

#[derive(Args, Debug)]
pub struct LoggerArgs {
    /// When to use color in output
    #[arg(short, long, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Print more output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub verbose: u8,

    /// Print less output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub quiet: u8,
}
