
use std::{
    ffi::OsString,
    fmt::Debug,
    path::{Path, PathBuf},
    process::{Output, Stdio},
};

use async_trait::async_trait;
use log::{debug, info};
use tokio::{process::Command, time::timeout};

use crate::{
    error::{Error, Result},
    job::{RemoteTarget, TransferSettings},
};

pub const DEFAULT_RSYNC_PROGRAM: &str = "rsync";

/// What a finished mirror process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl MirrorOutput {
    /// Trimmed stderr, or stdout if stderr is empty, or the exit status.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        if !stderr.is_empty() {
            stderr.to_owned()
        } else if !stdout.is_empty() {
            stdout.to_owned()
        } else {
            self.status.clone()
        }
    }
}

impl From<Output> for MirrorOutput {
    fn from(output: Output) -> Self {
        MirrorOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs one mirror process to completion with the given arguments.
#[async_trait]
pub trait MirrorRunner: Debug + Send + Sync {
    async fn run(&self, args: Vec<OsString>) -> Result<MirrorOutput>;
}

#[derive(Debug, Clone)]
pub struct RsyncRunner {
    program: PathBuf,
}

impl RsyncRunner {
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        RsyncRunner {
            program: program.as_ref().to_owned(),
        }
    }
}

impl Default for RsyncRunner {
    fn default() -> Self {
        RsyncRunner::new(DEFAULT_RSYNC_PROGRAM)
    }
}

#[async_trait]
impl MirrorRunner for RsyncRunner {
    async fn run(&self, args: Vec<OsString>) -> Result<MirrorOutput> {
        debug!("running {} {args:?}", self.program.display());
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Error::MirrorLaunch {
                program: self.program.display().to_string(),
                source,
            })?;

        Ok(output.into())
    }
}

/// Archive mode, compressed, deleting remote entries that are gone locally.
pub fn rsync_args(source_dir: &Path, target: &RemoteTarget, dry_run: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-avz".into(),
        "--delete".into(),
        "-e".into(),
        target.shell.clone().into(),
    ];
    if dry_run {
        args.push("--dry-run".into());
    }

    args.push(source_dir.into());
    args.push(target.destination().into());
    args
}

/// Replicates `source_dir` to the remote target in a single process run.
/// There is no retry and no partial success.
pub async fn mirror(
    runner: &dyn MirrorRunner,
    source_dir: &Path,
    target: &RemoteTarget,
    settings: &TransferSettings,
) -> Result<()> {
    let destination = target.destination();
    info!("Starting backup to remote server: {}", target.host);

    let args = rsync_args(source_dir, target, settings.dry_run);
    let run = runner.run(args);
    let output = match settings.mirror_timeout {
        Some(limit) => timeout(limit, run)
            .await
            .map_err(|_| Error::MirrorTimedOut {
                destination: destination.clone(),
                timeout: limit,
            })??,
        None => run.await?,
    };

    for line in output.stdout.lines() {
        debug!("{line}");
    }

    if output.success {
        Ok(())
    } else {
        Err(Error::MirrorFailed {
            destination,
            diagnostic: output.diagnostic(),
            status: output.status,
        })
    }
}
