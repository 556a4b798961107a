
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::Serialize;

use crate::{
    config::JobConfig,
    error::{Error, Result},
};

pub const DEFAULT_REMOTE_SHELL: &str = "ssh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Remote,
    S3,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Remote => write!(f, "remote"),
            StrategyKind::S3 => write!(f, "s3"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "remote" => Ok(StrategyKind::Remote),
            "s3" => Ok(StrategyKind::S3),
            "" => Err(Error::MissingStrategy),
            other => Err(Error::UnknownStrategy(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub user: String,
    pub host: String,
    pub dir: String,
    pub shell: String,
}

impl RemoteTarget {
    /// `user@host:dir`, as handed to the mirror process.
    pub fn destination(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTarget {
    pub bucket: String,
    pub local_store: Option<PathBuf>,
}

impl fmt::Display for BucketTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.local_store {
            Some(root) => write!(f, "file://{}/{}", root.display(), self.bucket),
            None => write!(f, "s3://{}", self.bucket),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    RemoteMirror(RemoteTarget),
    ObjectStore(BucketTarget),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::RemoteMirror(_) => StrategyKind::Remote,
            Strategy::ObjectStore(_) => StrategyKind::S3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub tasks: usize,
    pub dry_run: bool,
    pub mirror_timeout: Option<Duration>,
    pub upload_timeout: Option<Duration>,
}

impl Default for TransferSettings {
    fn default() -> Self {
        TransferSettings {
            tasks: 1,
            dry_run: false,
            mirror_timeout: None,
            upload_timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupJob {
    pub source_dir: PathBuf,
    pub strategy: Strategy,
    pub settings: TransferSettings,
}

impl BackupJob {
    pub fn new<P: AsRef<Path>>(source_dir: P, strategy: Strategy) -> Self {
        BackupJob {
            source_dir: source_dir.as_ref().to_owned(),
            strategy,
            settings: TransferSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: TransferSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validates a raw configuration. Only the options of the selected
    /// strategy are checked; the others are ignored.
    pub fn from_config(config: &JobConfig, settings: TransferSettings) -> Result<Self> {
        let kind: StrategyKind = config
            .strategy
            .as_deref()
            .ok_or(Error::MissingStrategy)?
            .parse()?;
        let source_dir = config.source_dir.clone().ok_or(Error::MissingSourceDir)?;

        let strategy = match kind {
            StrategyKind::Remote => Strategy::RemoteMirror(RemoteTarget {
                user: required(kind, "remoteUser", config.remote_user.as_ref())?,
                host: required(kind, "remoteHost", config.remote_host.as_ref())?,
                dir: required(kind, "remoteDir", config.remote_dir.as_ref())?,
                shell: config
                    .remote_shell
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REMOTE_SHELL.to_owned()),
            }),
            StrategyKind::S3 => Strategy::ObjectStore(BucketTarget {
                bucket: required(kind, "bucketName", config.bucket_name.as_ref())?,
                local_store: config.local_store.clone(),
            }),
        };

        Ok(BackupJob {
            source_dir,
            strategy,
            settings,
        })
    }
}

fn required(
    strategy: StrategyKind,
    option: &'static str,
    value: Option<&String>,
) -> Result<String> {
    match value.map(|s| s.trim()) {
        Some(s) if !s.is_empty() => Ok(s.to_owned()),
        _ => Err(Error::MissingOption { strategy, option }),
    }
}
